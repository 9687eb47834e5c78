//! The election node: wires the engine components into tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use quorum_consensus::{
    Broadcaster, Clock, Election, ElectionVoter, TransactionStore, VotePrioritizer,
    VoteSigner, VoteWeightService,
};

use crate::config::NodeConfig;
use crate::election_monitor::ElectionMonitor;
use crate::election_service::ElectionService;
use crate::error::NodeError;
use crate::handle::NodeHandle;
use crate::metrics::NodeMetrics;
use crate::prioritizer_service::PrioritizerService;
use crate::router::Router;
use crate::shutdown::ShutdownController;
use crate::sweeper::spawn_sweeps;
use crate::voter_service::VoterService;

/// How long [`ElectionNode::stop`] waits for tasks to finish.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Collaborators the engine is built around.
pub struct NodeDependencies {
    pub weights: Arc<dyn VoteWeightService>,
    /// Signing key of the local representative. `None` disables voting.
    pub signer: Option<Arc<dyn VoteSigner>>,
    pub store: Arc<dyn TransactionStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub clock: Arc<dyn Clock>,
}

/// A running election engine.
///
/// Owns the tasks for the election set, the vote prioritizer, the local
/// voter, the confirmation monitor and the sweep timers. Interact with it
/// through [`ElectionNode::handle`].
pub struct ElectionNode {
    handle: NodeHandle,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl ElectionNode {
    /// Validate `config` and spawn every task. Must be called from within a
    /// tokio runtime.
    pub fn start(config: NodeConfig, deps: NodeDependencies) -> Result<Self, NodeError> {
        config.validate(deps.signer.is_some())?;

        let metrics = Arc::new(NodeMetrics::new());
        let (router, inboxes) = Router::new(metrics);
        let (votes_tx, votes_rx) = mpsc::channel(config.vote_channel_size);
        let shutdown = ShutdownController::new();
        let mut task_handles = Vec::new();

        let election = ElectionService::new(
            Election::new(Arc::clone(&deps.weights), config.recently_confirmed_size),
            router.clone(),
            Arc::clone(&deps.clock),
            config.staling_after(),
            config.staled_after(),
        );
        task_handles.push(tokio::spawn(
            election.run(inboxes.election, votes_rx, shutdown.subscribe()),
        ));

        let prioritizer = PrioritizerService::new(
            VotePrioritizer::new(&config.prioritizer_config()),
            Arc::clone(&deps.weights),
            router.clone(),
            config.poll_interval(),
        );
        task_handles.push(tokio::spawn(
            prioritizer.run(inboxes.prioritizer, votes_tx, shutdown.subscribe()),
        ));

        let voter = VoterService::new(
            ElectionVoter::new(
                config.voter_config(),
                deps.signer.clone(),
                Arc::clone(&deps.weights),
                Arc::clone(&deps.store),
            ),
            router.clone(),
            Arc::clone(&deps.broadcaster),
            Arc::clone(&deps.clock),
        );
        task_handles.push(tokio::spawn(voter.run(inboxes.voter, shutdown.subscribe())));

        let monitor = ElectionMonitor::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.broadcaster),
            router.clone(),
        );
        task_handles.push(tokio::spawn(
            monitor.run(inboxes.monitor, shutdown.subscribe()),
        ));

        task_handles.extend(spawn_sweeps(
            &router,
            &shutdown.subscribe(),
            config.sweep_interval(),
            config.expiry_sweep_offset(),
        ));

        tracing::info!(
            voter_strategy = ?config.voter_strategy,
            signer = deps.signer.is_some(),
            queue_max = config.queue_group_max_size,
            vote_channel = config.vote_channel_size,
            buffer_max = config.vote_buffer_max_size,
            tasks = task_handles.len(),
            "election node started"
        );

        Ok(Self {
            handle: NodeHandle::new(router),
            shutdown,
            task_handles,
        })
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    /// Signal every task to stop and wait for them, up to a timeout.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("election node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            let mut failure = None;
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "node task failed");
                    failure.get_or_insert(e.to_string());
                }
            }
            failure
        };

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await {
            Err(_) => {
                tracing::warn!(timeout = ?SHUTDOWN_TIMEOUT, "shutdown timed out, some tasks may still be running");
                Err(NodeError::ShutdownTimeout)
            }
            Ok(Some(failure)) => Err(NodeError::Task(failure)),
            Ok(None) => {
                tracing::info!("election node stopped");
                Ok(())
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_shutdown() && self.task_handles.is_empty()
    }
}
