//! Outbound gossip seam.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

use crate::transaction::Transaction;
use crate::vote::Vote;

/// Which peers a message is sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastStrategy {
    Everyone,
    /// Only peers known to be voting representatives.
    Voters,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastPayload {
    Vote { transaction: Transaction, vote: Vote },
    Transaction(Transaction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastMessage {
    pub strategy: BroadcastStrategy,
    /// Peers to skip, typically the ones the payload came from.
    pub exceptions: HashSet<SocketAddr>,
    pub payload: BroadcastPayload,
}

impl BroadcastMessage {
    pub fn new(strategy: BroadcastStrategy, payload: BroadcastPayload) -> Self {
        Self {
            strategy,
            exceptions: HashSet::new(),
            payload,
        }
    }

    pub fn except(mut self, peer: SocketAddr) -> Self {
        self.exceptions.insert(peer);
        self
    }
}

/// Hands messages to the transport. Delivery is fire-and-forget.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, message: BroadcastMessage);
}
