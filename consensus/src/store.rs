//! Persistence seam for confirmed transactions.

use quorum_types::TxHash;

use crate::error::ConsensusError;
use crate::transaction::Transaction;
use crate::vote::Vote;

/// Durable storage for confirmed transactions and their final votes.
pub trait TransactionStore: Send + Sync {
    /// Whether a transaction with this hash is already persisted.
    fn exists(&self, hash: &TxHash) -> Result<bool, ConsensusError>;

    /// Persist a confirmed transaction together with the final votes that
    /// confirmed it.
    fn save_confirmed(&self, transaction: &Transaction, votes: &[Vote])
        -> Result<(), ConsensusError>;
}
