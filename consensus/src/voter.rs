//! This node's own voting policy.
//!
//! Reacts to election events by casting non-final votes for the current
//! leader and a single final vote per slot once agreement is reached. Votes
//! are only cast when voting is enabled and the local representative holds
//! at least the configured minimum weight.

use quorum_types::{Amount, Slot, Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::broadcast::BroadcastStrategy;
use crate::election::ElectionEvent;
use crate::error::ConsensusError;
use crate::rep_weights::VoteWeightService;
use crate::signer::VoteSigner;
use crate::store::TransactionStore;
use crate::transaction::{Transaction, TransactionRejectionReason};
use crate::vote::Vote;

/// Whether this node takes part in voting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoterStrategy {
    /// Vote when a signing key is configured.
    #[default]
    Default,
    /// Always vote. Requires a signing key.
    ForceEnabled,
    /// Never vote.
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterConfig {
    pub strategy: VoterStrategy,
    /// Minimum own weight required to vote.
    pub min_weight: Amount,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            strategy: VoterStrategy::Default,
            min_weight: Amount::new(1_000_000_000_000_000),
        }
    }
}

/// A vote this node produced, to be folded into the local election and
/// broadcast with `strategy`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastVote {
    pub transaction: Transaction,
    pub vote: Vote,
    pub strategy: BroadcastStrategy,
}

pub struct ElectionVoter {
    config: VoterConfig,
    signer: Option<Arc<dyn VoteSigner>>,
    weights: Arc<dyn VoteWeightService>,
    store: Arc<dyn TransactionStore>,
    last_voted: HashMap<Slot, TxHash>,
    final_voted: HashSet<Slot>,
    last_timestamp: Timestamp,
}

impl ElectionVoter {
    pub fn new(
        config: VoterConfig,
        signer: Option<Arc<dyn VoteSigner>>,
        weights: Arc<dyn VoteWeightService>,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            config,
            signer,
            weights,
            store,
            last_voted: HashMap::new(),
            final_voted: HashSet::new(),
            last_timestamp: Timestamp::EPOCH,
        }
    }

    /// React to an election event; returns the votes cast in response.
    pub fn on_event(&mut self, event: &ElectionEvent, now: Timestamp) -> Vec<CastVote> {
        match event {
            ElectionEvent::Started { leader, .. } => {
                if self.last_voted.contains_key(&leader.slot()) {
                    return Vec::new();
                }
                self.consensed(leader, now)
            }
            ElectionEvent::ConsensusChanged { transaction } => self.consensed(transaction, now),
            ElectionEvent::AgreementReached { transaction } => {
                let slot = transaction.slot();
                if !self.final_voted.insert(slot) {
                    return Vec::new();
                }
                self.last_voted.insert(slot, transaction.hash);
                self.vote(transaction, Timestamp::FINAL).into_iter().collect()
            }
            ElectionEvent::Staling { transaction } => {
                let slot = transaction.slot();
                let timestamp = if self.final_voted.contains(&slot) {
                    Timestamp::FINAL
                } else {
                    self.last_voted.insert(slot, transaction.hash);
                    self.next_timestamp(now)
                };
                self.vote(transaction, timestamp).into_iter().collect()
            }
            ElectionEvent::Confirmed { transaction, .. } | ElectionEvent::Staled { transaction } => {
                let slot = transaction.slot();
                self.last_voted.remove(&slot);
                self.final_voted.remove(&slot);
                Vec::new()
            }
        }
    }

    /// A transaction was refused because its slot is already occupied. If it
    /// is in fact the persisted one, re-announce it with a final vote so
    /// lagging peers converge.
    pub fn on_transaction_rejected(
        &mut self,
        transaction: &Transaction,
        reason: TransactionRejectionReason,
    ) -> Result<Option<CastVote>, ConsensusError> {
        if reason != TransactionRejectionReason::OldTransaction {
            return Ok(None);
        }
        if !self.store.exists(&transaction.hash)? {
            return Ok(None);
        }
        tracing::debug!(hash = %transaction.hash, "late final vote for persisted transaction");
        Ok(self.vote(transaction, Timestamp::FINAL))
    }

    /// Whether this node would currently cast a vote.
    pub fn can_vote(&self) -> bool {
        let Some(signer) = self.signer.as_ref() else {
            return false;
        };
        let enabled = match self.config.strategy {
            VoterStrategy::Disabled => false,
            VoterStrategy::Default | VoterStrategy::ForceEnabled => true,
        };
        enabled && self.weights.weight_of(&signer.public_key()) >= self.config.min_weight
    }

    /// Slots this voter currently tracks.
    pub fn tracked_slots(&self) -> usize {
        self.last_voted.len()
    }

    pub fn has_final_voted(&self, slot: &Slot) -> bool {
        self.final_voted.contains(slot)
    }

    fn consensed(&mut self, transaction: &Transaction, now: Timestamp) -> Vec<CastVote> {
        let slot = transaction.slot();
        if self.final_voted.contains(&slot) || self.last_voted.get(&slot) == Some(&transaction.hash) {
            return Vec::new();
        }
        self.last_voted.insert(slot, transaction.hash);
        let timestamp = self.next_timestamp(now);
        self.vote(transaction, timestamp).into_iter().collect()
    }

    /// Own non-final timestamps strictly increase so re-votes always supersede.
    fn next_timestamp(&mut self, now: Timestamp) -> Timestamp {
        let timestamp = now.max(self.last_timestamp.next());
        self.last_timestamp = timestamp;
        timestamp
    }

    fn vote(&self, transaction: &Transaction, timestamp: Timestamp) -> Option<CastVote> {
        if !self.can_vote() {
            return None;
        }
        let signer = self.signer.as_ref()?;
        let public_key = signer.public_key();
        let payload = Vote::signing_payload(&transaction.hash, timestamp, &public_key);
        let vote = Vote::new(
            transaction.hash,
            public_key,
            timestamp,
            signer.sign(&payload),
            self.weights.weight_of(&public_key),
        );
        let strategy = if vote.is_final() {
            BroadcastStrategy::Everyone
        } else {
            BroadcastStrategy::Voters
        };
        tracing::debug!(hash = %transaction.hash, %timestamp, ?strategy, "casting vote");
        Some(CastVote {
            transaction: transaction.clone(),
            vote,
            strategy,
        })
    }
}
