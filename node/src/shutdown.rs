//! Graceful shutdown controller for the election node.
//!
//! Built on a `tokio::sync::watch` channel so that a task subscribing after
//! the signal still observes it. Can also be driven by SIGINT/SIGTERM.

use tokio::signal;
use tokio::sync::watch;

/// Coordinates graceful shutdown across all node tasks.
///
/// Tasks call [`ShutdownController::subscribe`] and `select!` on
/// [`ShutdownSignal::recv`] alongside their main loop.
#[derive(Debug)]
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// A task's view of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    tracing::info!("received SIGINT, shutting down");
                }
                _ = terminate.recv() => { tracing::info!("received SIGTERM, shutting down"); }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            tracing::info!("received SIGINT, shutting down");
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered, or the controller dropped.
    pub async fn recv(&mut self) {
        // An error means the controller is gone; treat it as shutdown.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut signal = controller.subscribe();
        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("signal should resolve");
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn late_subscribers_see_shutdown() {
        let controller = ShutdownController::new();
        controller.shutdown();
        let mut late = controller.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.recv())
            .await
            .expect("late subscriber should observe shutdown");
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn dropped_controller_releases_waiters() {
        let controller = ShutdownController::new();
        let mut signal = controller.subscribe();
        drop(controller);
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("dropping the controller should release waiters");
    }

    #[tokio::test]
    async fn no_signal_before_shutdown() {
        let controller = ShutdownController::new();
        let mut signal = controller.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.recv()).await;
        assert!(waited.is_err());
    }
}
