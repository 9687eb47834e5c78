//! Nullable store: thread-safe in-memory transaction storage for testing.

use quorum_consensus::{ConsensusError, Transaction, TransactionStore, Vote};
use quorum_types::TxHash;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory confirmed-transaction store.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    confirmed: Mutex<HashMap<TxHash, (Transaction, Vec<Vote>)>>,
    failing: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            confirmed: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent save fail with a store error.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a transaction as already persisted.
    pub fn insert(&self, transaction: Transaction) {
        self.confirmed
            .lock()
            .unwrap()
            .insert(transaction.hash, (transaction, Vec::new()));
    }

    /// Final votes persisted with a transaction.
    pub fn votes_for(&self, hash: &TxHash) -> Option<Vec<Vote>> {
        self.confirmed
            .lock()
            .unwrap()
            .get(hash)
            .map(|(_, votes)| votes.clone())
    }

    pub fn len(&self) -> usize {
        self.confirmed.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStore for NullStore {
    fn exists(&self, hash: &TxHash) -> Result<bool, ConsensusError> {
        Ok(self.confirmed.lock().unwrap().contains_key(hash))
    }

    fn save_confirmed(&self, transaction: &Transaction, votes: &[Vote]) -> Result<(), ConsensusError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConsensusError::Store("write failure injected".into()));
        }
        self.confirmed
            .lock()
            .unwrap()
            .insert(transaction.hash, (transaction.clone(), votes.to_vec()));
        Ok(())
    }
}
