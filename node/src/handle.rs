//! Cloneable entry point into a running [`ElectionNode`](crate::ElectionNode).
//!
//! Transport and ledger code feed the engine through a [`NodeHandle`]; every
//! call only enqueues a command, so none of them block.

use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

use quorum_consensus::{Transaction, TransactionRejectionReason, Vote};
use quorum_types::TxHash;

use crate::election_service::{CandidateTally, ElectionCommand, ElectionSnapshot};
use crate::events::NodeEvent;
use crate::metrics::NodeMetrics;
use crate::prioritizer_service::{PrioritizerCommand, PrioritizerSnapshot};
use crate::router::Router;
use crate::NodeError;

#[derive(Clone)]
pub struct NodeHandle {
    router: Router,
}

impl NodeHandle {
    pub(crate) fn new(router: Router) -> Self {
        Self { router }
    }

    /// A vote arrived from the network. Its weight is looked up on admission.
    pub fn vote_received(&self, vote: Vote) -> Result<(), NodeError> {
        ok_or_closed(self.router.vote_received(vote), "prioritizer")
    }

    /// Ledger validation accepted `transaction`; start or join its election.
    pub fn transaction_validated(&self, transaction: Transaction) -> Result<(), NodeError> {
        ok_or_closed(self.router.transaction_validated(transaction), "election")
    }

    /// Ledger validation refused `transaction`.
    pub fn transaction_rejected(
        &self,
        transaction: Transaction,
        reason: TransactionRejectionReason,
    ) -> Result<(), NodeError> {
        ok_or_closed(self.router.transaction_rejected(transaction, reason), "rejection")
    }

    /// Run a staling sweep now instead of waiting for the timer.
    pub fn run_staling_sweep(&self) -> Result<(), NodeError> {
        ok_or_closed(self.router.to_election(ElectionCommand::ProcessStaling), "election")
    }

    /// Run an expiry sweep now instead of waiting for the timer.
    pub fn run_expiry_sweep(&self) -> Result<(), NodeError> {
        ok_or_closed(
            self.router.to_election(ElectionCommand::ProcessStaledExpiry),
            "election",
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.router.subscribe()
    }

    pub async fn election_snapshot(&self) -> Result<ElectionSnapshot, NodeError> {
        let (tx, rx) = oneshot::channel();
        if !self.router.to_election(ElectionCommand::Snapshot(tx)) {
            return Err(NodeError::ChannelClosed("election"));
        }
        rx.await.map_err(|_| NodeError::ChannelClosed("election"))
    }

    /// Current tally for one candidate, if it is in an open election.
    pub async fn tally(&self, hash: TxHash) -> Result<Option<CandidateTally>, NodeError> {
        let (tx, rx) = oneshot::channel();
        if !self.router.to_election(ElectionCommand::Tally(hash, tx)) {
            return Err(NodeError::ChannelClosed("election"));
        }
        rx.await.map_err(|_| NodeError::ChannelClosed("election"))
    }

    pub async fn prioritizer_snapshot(&self) -> Result<PrioritizerSnapshot, NodeError> {
        let (tx, rx) = oneshot::channel();
        if !self.router.to_prioritizer(PrioritizerCommand::Snapshot(tx)) {
            return Err(NodeError::ChannelClosed("prioritizer"));
        }
        rx.await.map_err(|_| NodeError::ChannelClosed("prioritizer"))
    }

    pub fn metrics(&self) -> Arc<NodeMetrics> {
        Arc::clone(&self.router.metrics)
    }
}

fn ok_or_closed(delivered: bool, channel: &'static str) -> Result<(), NodeError> {
    if delivered {
        Ok(())
    } else {
        Err(NodeError::ChannelClosed(channel))
    }
}
