//! Weight-ordered queue of votes waiting to be folded into elections.
//!
//! Holds at most one pending vote per `(voter, candidate)`. Heavier votes are
//! processed first; under capacity pressure the globally lightest vote is
//! evicted, whichever key it belongs to.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use quorum_types::Amount;

use crate::vote::{TransactionVote, VoteKey};

/// Position of an entry in the priority index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueueRank {
    weight: Amount,
    /// Admission order, unique per entry.
    sequence: u64,
}

impl Ord for QueueRank {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher weight ranks higher. On tie, earlier admission ranks higher.
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending votes indexed both by key and by rank.
pub struct VoteQueue {
    entries: HashMap<VoteKey, (TransactionVote, QueueRank)>,
    order: BTreeMap<QueueRank, VoteKey>,
    max_size: usize,
    next_sequence: u64,
}

impl VoteQueue {
    /// A queue holding at most `max_size` distinct keys.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            max_size,
            next_sequence: 0,
        }
    }

    /// Admit an entry. Returns the entry dropped as a consequence, if any:
    /// the new entry itself when an equal or newer vote is already pending
    /// for its key, or the lightest entry when a new key overflows capacity.
    pub fn add(&mut self, entry: TransactionVote) -> Option<TransactionVote> {
        let key = entry.vote.key();

        let replaced = match self.entries.get(&key) {
            Some((existing, _)) if existing.vote.timestamp >= entry.vote.timestamp => {
                return Some(entry);
            }
            Some((_, rank)) => {
                let rank = *rank;
                self.order.remove(&rank);
                true
            }
            None => false,
        };

        let rank = QueueRank {
            weight: entry.vote.weight,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.order.insert(rank, key);
        self.entries.insert(key, (entry, rank));

        if !replaced && self.entries.len() > self.max_size {
            return self.pop_lowest();
        }
        None
    }

    /// Remove and return the heaviest pending entry.
    pub fn poll(&mut self) -> Option<TransactionVote> {
        let (_, key) = self.order.pop_last()?;
        self.entries.remove(&key).map(|(entry, _)| entry)
    }

    /// Number of distinct keys pending.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending entry. Admission sequence keeps counting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn pop_lowest(&mut self) -> Option<TransactionVote> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key).map(|(entry, _)| entry)
    }
}
