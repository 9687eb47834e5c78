//! Periodic staling and expiry sweeps over the election set.
//!
//! Two independent timers. The expiry sweep runs offset from the staling
//! sweep so a candidate is rebroadcast at least once before it can expire.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::election_service::ElectionCommand;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

/// Spawn both sweep timers. The first staling sweep fires one `interval`
/// after startup, the first expiry sweep `offset` later.
pub(crate) fn spawn_sweeps(
    router: &Router,
    shutdown: &ShutdownSignal,
    interval: Duration,
    offset: Duration,
) -> Vec<JoinHandle<()>> {
    let start = Instant::now() + interval;
    vec![
        tokio::spawn(sweep(
            "staling",
            router.clone(),
            shutdown.clone(),
            start,
            interval,
            || ElectionCommand::ProcessStaling,
        )),
        tokio::spawn(sweep(
            "expiry",
            router.clone(),
            shutdown.clone(),
            start + offset,
            interval,
            || ElectionCommand::ProcessStaledExpiry,
        )),
    ]
}

async fn sweep(
    name: &'static str,
    router: Router,
    mut shutdown: ShutdownSignal,
    start: Instant,
    period: Duration,
    command: fn() -> ElectionCommand,
) {
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!(sweep = name, "sweep task shutting down");
                break;
            }
            _ = interval.tick() => {
                tracing::trace!(sweep = name, "running election sweep");
                if !router.to_election(command()) {
                    break;
                }
            }
        }
    }
}
