//! Nullable network: record broadcasts without sending them.

use quorum_consensus::{BroadcastMessage, BroadcastPayload, BroadcastStrategy, Broadcaster};
use std::sync::Mutex;

/// A test broadcaster that records messages instead of sending them.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullNetwork {
    sent: Mutex<Vec<BroadcastMessage>>,
}

impl NullNetwork {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All messages "sent" so far (for assertions).
    pub fn sent(&self) -> Vec<BroadcastMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent votes as `(strategy, is_final)` pairs, in send order.
    pub fn sent_votes(&self) -> Vec<(BroadcastStrategy, bool)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match &m.payload {
                BroadcastPayload::Vote { vote, .. } => Some((m.strategy, vote.is_final())),
                BroadcastPayload::Transaction(_) => None,
            })
            .collect()
    }

    /// Number of transaction rebroadcasts sent so far.
    pub fn sent_transactions(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m.payload, BroadcastPayload::Transaction(_)))
            .count()
    }
}

impl Default for NullNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for NullNetwork {
    fn publish(&self, message: BroadcastMessage) {
        self.sent.lock().unwrap().push(message);
    }
}
