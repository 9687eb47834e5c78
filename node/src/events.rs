//! Events the node publishes to its subscribers.

use quorum_consensus::{CastVote, ElectionEvent, Transaction, VoteEvent};

/// Everything observable about the engine from the outside.
///
/// Delivered over a `tokio::sync::broadcast` channel; slow subscribers miss
/// events rather than stall the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// An election lifecycle transition.
    Election(ElectionEvent),
    /// A vote was dropped or rejected before reaching an election.
    Vote(VoteEvent),
    /// This node cast a vote.
    VoteCast(CastVote),
    /// A confirmed transaction and its final votes were persisted.
    TransactionSaved(Transaction),
}
