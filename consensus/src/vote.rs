//! Votes: a representative's signed opinion on one candidate.

use quorum_crypto::{blake2b_256_multi, verify_signature};
use quorum_types::{Amount, PublicKey, Signature, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// A vote for one candidate transaction.
///
/// `weight` is the voter's representative weight at the time the vote was
/// admitted; it is supplied by the weight service, never derived from the
/// vote itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Candidate transaction hash being voted for.
    pub hash: TxHash,
    pub public_key: PublicKey,
    /// Wall-clock time of the vote, or [`Timestamp::FINAL`].
    pub timestamp: Timestamp,
    pub signature: Signature,
    pub weight: Amount,
}

impl Vote {
    pub fn new(
        hash: TxHash,
        public_key: PublicKey,
        timestamp: Timestamp,
        signature: Signature,
        weight: Amount,
    ) -> Self {
        Self {
            hash,
            public_key,
            timestamp,
            signature,
            weight,
        }
    }

    /// Final votes are irrevocable: nothing from the same voter supersedes them.
    pub fn is_final(&self) -> bool {
        self.timestamp.is_final()
    }

    pub fn key(&self) -> VoteKey {
        VoteKey {
            public_key: self.public_key,
            hash: self.hash,
        }
    }

    /// The 32-byte payload a voter signs, binding candidate, timestamp and voter.
    pub fn signing_payload(hash: &TxHash, timestamp: Timestamp, public_key: &PublicKey) -> [u8; 32] {
        blake2b_256_multi(&[hash.as_bytes(), &timestamp.to_le_bytes(), public_key.as_bytes()])
    }

    /// Check the signature against the payload.
    pub fn verify(&self) -> bool {
        let payload = Self::signing_payload(&self.hash, self.timestamp, &self.public_key);
        verify_signature(&payload, &self.signature, &self.public_key)
    }
}

/// Identity of a pending vote in the prioritization queue: one entry per
/// voter and candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoteKey {
    pub public_key: PublicKey,
    pub hash: TxHash,
}

/// A vote paired with the candidate it is for, as it travels from the
/// prioritizer to the election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionVote {
    pub transaction: Transaction,
    pub vote: Vote,
}

impl TransactionVote {
    pub fn new(transaction: Transaction, vote: Vote) -> Self {
        Self { transaction, vote }
    }
}

/// Why an admitted vote was discarded before reaching an election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDropReason {
    /// Evicted from the queue by a heavier vote, or older than a queued one.
    Superseded,
    /// Buffered waiting for an election that never started.
    NoElection,
    /// The candidate transaction was rejected by validation.
    TransactionDropped,
}

/// Why a vote was refused at admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteRejectionReason {
    /// The voter holds no representative weight.
    InvalidVotingWeight,
}

impl VoteDropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::NoElection => "no_election",
            Self::TransactionDropped => "transaction_dropped",
        }
    }
}

impl VoteRejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidVotingWeight => "invalid_voting_weight",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_crypto::{keypair_from_seed, sign_message};

    fn signed_vote(timestamp: Timestamp) -> Vote {
        let kp = keypair_from_seed(&[11u8; 32]);
        let hash = TxHash::new([1u8; 32]);
        let payload = Vote::signing_payload(&hash, timestamp, &kp.public);
        let signature = sign_message(&payload, &kp.private);
        Vote::new(hash, kp.public, timestamp, signature, Amount::new(10))
    }

    #[test]
    fn final_flag_follows_timestamp() {
        assert!(signed_vote(Timestamp::FINAL).is_final());
        assert!(!signed_vote(Timestamp::from_millis(1_000)).is_final());
    }

    #[test]
    fn signature_binds_timestamp() {
        let mut vote = signed_vote(Timestamp::from_millis(1_000));
        assert!(vote.verify());

        vote.timestamp = Timestamp::FINAL;
        assert!(!vote.verify());
    }

    #[test]
    fn payload_differs_per_voter() {
        let hash = TxHash::new([1u8; 32]);
        let ts = Timestamp::from_millis(5);
        assert_ne!(
            Vote::signing_payload(&hash, ts, &PublicKey([1u8; 32])),
            Vote::signing_payload(&hash, ts, &PublicKey([2u8; 32]))
        );
    }

    #[test]
    fn key_pairs_voter_and_candidate() {
        let vote = signed_vote(Timestamp::FINAL);
        let key = vote.key();
        assert_eq!(key.public_key, vote.public_key);
        assert_eq!(key.hash, vote.hash);
    }
}
