//! Candidate transactions as seen by the election engine.
//!
//! Only the fields needed to identify competing candidates are carried here;
//! structural and cryptographic validation happens before a transaction is
//! handed to the engine.

use quorum_types::{Height, PublicKey, Slot, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

/// A validated transaction competing for its account slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: TxHash,
    /// Account whose chain this transaction extends.
    pub account: PublicKey,
    pub height: Height,
    /// When this node first received the transaction. Drives staling.
    pub received_at: Timestamp,
}

impl Transaction {
    pub fn new(hash: TxHash, account: PublicKey, height: Height, received_at: Timestamp) -> Self {
        Self {
            hash,
            account,
            height,
            received_at,
        }
    }

    /// The slot this transaction competes for.
    pub fn slot(&self) -> Slot {
        Slot::new(self.account, self.height)
    }
}

/// Why the validation layer refused a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionRejectionReason {
    InvalidTransaction,
    InvalidBalance,
    InvalidAmount,
    InvalidReceiver,
    InvalidTimestamp,
    InvalidVersion,
    InvalidPrevious,
    InvalidRepresentative,
    AccountNotFound,
    PreviousNotFound,
    SendNotFound,
    SendNotConfirmed,
    SendAlreadyUsed,
    /// The slot is already occupied by a persisted transaction.
    OldTransaction,
}

impl TransactionRejectionReason {
    /// Whether the transaction may become valid later (e.g. once a missing
    /// dependency arrives).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound
                | Self::PreviousNotFound
                | Self::SendNotFound
                | Self::SendNotConfirmed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forks_share_a_slot() {
        let account = PublicKey([1u8; 32]);
        let a = Transaction::new(TxHash::new([2u8; 32]), account, Height::new(7), Timestamp::EPOCH);
        let b = Transaction::new(TxHash::new([3u8; 32]), account, Height::new(7), Timestamp::EPOCH);
        let next = Transaction::new(TxHash::new([4u8; 32]), account, Height::new(8), Timestamp::EPOCH);

        assert_eq!(a.slot(), b.slot());
        assert_ne!(a.slot(), next.slot());
    }

    #[test]
    fn only_missing_dependencies_are_recoverable() {
        assert!(TransactionRejectionReason::PreviousNotFound.is_recoverable());
        assert!(TransactionRejectionReason::SendNotConfirmed.is_recoverable());
        assert!(!TransactionRejectionReason::OldTransaction.is_recoverable());
        assert!(!TransactionRejectionReason::InvalidPrevious.is_recoverable());
    }
}
