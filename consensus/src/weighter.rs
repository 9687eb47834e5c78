//! Per-candidate vote tally.

use quorum_types::{Amount, PublicKey};
use std::collections::HashMap;

use crate::transaction::Transaction;
use crate::vote::Vote;

/// Votes collected for one candidate transaction, at most one per voter.
#[derive(Debug, Clone)]
pub struct TransactionWeighter {
    transaction: Transaction,
    votes: HashMap<PublicKey, Vote>,
}

impl TransactionWeighter {
    /// An empty tally for `transaction`.
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            votes: HashMap::new(),
        }
    }

    /// Store a vote. Returns `false` (and keeps the stored vote) unless the
    /// new vote's timestamp is strictly newer than the voter's current one.
    pub fn add(&mut self, vote: Vote) -> bool {
        if let Some(existing) = self.votes.get(&vote.public_key) {
            if existing.timestamp >= vote.timestamp {
                return false;
            }
        }
        self.votes.insert(vote.public_key, vote);
        true
    }

    /// Drop the voter's vote, typically because they moved it to another
    /// candidate in the same slot.
    pub fn remove(&mut self, voter: &PublicKey) -> Option<Vote> {
        self.votes.remove(voter)
    }

    /// The vote currently held for `voter`, if any.
    pub fn vote_of(&self, voter: &PublicKey) -> Option<&Vote> {
        self.votes.get(voter)
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Held votes in no particular order.
    pub fn votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.values()
    }

    /// Number of voters with a vote held.
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Sum of the weights of all held votes, final or not.
    pub fn total_weight(&self) -> Amount {
        self.votes.values().map(|v| v.weight).sum()
    }

    /// Weight carried by final votes only. Confirmation is decided on this.
    pub fn total_final_weight(&self) -> Amount {
        self.votes
            .values()
            .filter(|v| v.is_final())
            .map(|v| v.weight)
            .sum()
    }

    /// Final votes, ordered by voter key.
    pub fn final_votes(&self) -> Vec<Vote> {
        let mut votes: Vec<Vote> = self.votes.values().filter(|v| v.is_final()).cloned().collect();
        votes.sort_by(|a, b| a.public_key.cmp(&b.public_key));
        votes
    }
}
