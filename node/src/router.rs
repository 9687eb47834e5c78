//! Channels between the node's tasks.
//!
//! Every engine component owns its state inside one task and is reached only
//! through its command channel. Command channels are unbounded: the election
//! and voter tasks feed each other, and a bounded cycle could deadlock.
//! Prioritized votes travel on a separate bounded channel owned by the
//! prioritizer, since nothing flows back from the election task to it
//! that the election task waits on.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use quorum_consensus::{Transaction, TransactionRejectionReason, Vote};
use quorum_types::TxHash;

use crate::election_monitor::MonitorCommand;
use crate::election_service::ElectionCommand;
use crate::events::NodeEvent;
use crate::metrics::NodeMetrics;
use crate::prioritizer_service::PrioritizerCommand;
use crate::voter_service::VoterCommand;

/// Receiving ends, handed to the tasks at startup.
pub(crate) struct Inboxes {
    pub election: mpsc::UnboundedReceiver<ElectionCommand>,
    pub prioritizer: mpsc::UnboundedReceiver<PrioritizerCommand>,
    pub voter: mpsc::UnboundedReceiver<VoterCommand>,
    pub monitor: mpsc::UnboundedReceiver<MonitorCommand>,
}

/// Sending ends of every task's command channel, plus the event stream.
#[derive(Clone)]
pub(crate) struct Router {
    election: mpsc::UnboundedSender<ElectionCommand>,
    prioritizer: mpsc::UnboundedSender<PrioritizerCommand>,
    voter: mpsc::UnboundedSender<VoterCommand>,
    monitor: mpsc::UnboundedSender<MonitorCommand>,
    events: broadcast::Sender<NodeEvent>,
    pub metrics: Arc<NodeMetrics>,
}

const EVENT_CHANNEL_CAPACITY: usize = 1024;

impl Router {
    pub fn new(metrics: Arc<NodeMetrics>) -> (Self, Inboxes) {
        let (election, election_rx) = mpsc::unbounded_channel();
        let (prioritizer, prioritizer_rx) = mpsc::unbounded_channel();
        let (voter, voter_rx) = mpsc::unbounded_channel();
        let (monitor, monitor_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let router = Self {
            election,
            prioritizer,
            voter,
            monitor,
            events,
            metrics,
        };
        let inboxes = Inboxes {
            election: election_rx,
            prioritizer: prioritizer_rx,
            voter: voter_rx,
            monitor: monitor_rx,
        };
        (router, inboxes)
    }

    pub fn to_election(&self, command: ElectionCommand) -> bool {
        deliver(&self.election, command, "election")
    }

    pub fn to_prioritizer(&self, command: PrioritizerCommand) -> bool {
        deliver(&self.prioritizer, command, "prioritizer")
    }

    pub fn to_voter(&self, command: VoterCommand) -> bool {
        deliver(&self.voter, command, "voter")
    }

    pub fn to_monitor(&self, command: MonitorCommand) -> bool {
        deliver(&self.monitor, command, "monitor")
    }

    /// Publish to subscribers. Having none is not an error.
    pub fn publish(&self, event: NodeEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    // ── Convenience wrappers used by the public handle ─────────────────

    pub fn vote_received(&self, vote: Vote) -> bool {
        self.to_prioritizer(PrioritizerCommand::VoteReceived(vote))
    }

    pub fn transaction_validated(&self, transaction: Transaction) -> bool {
        self.to_election(ElectionCommand::Observe(transaction))
    }

    pub fn transaction_rejected(
        &self,
        transaction: Transaction,
        reason: TransactionRejectionReason,
    ) -> bool {
        let hash: TxHash = transaction.hash;
        self.to_prioritizer(PrioritizerCommand::TransactionRejected(hash))
            && self.to_voter(VoterCommand::TransactionRejected(transaction, reason))
    }
}

/// Send, logging instead of failing when the receiving task is gone.
fn deliver<T>(tx: &mpsc::UnboundedSender<T>, command: T, target: &'static str) -> bool {
    if tx.send(command).is_err() {
        tracing::trace!(target_task = target, "command dropped, task stopped");
        return false;
    }
    true
}
