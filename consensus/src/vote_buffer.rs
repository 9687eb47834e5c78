//! Vote buffer: holds votes that arrive before their election starts.
//!
//! Votes can arrive out of order: a representative may broadcast a vote for
//! a transaction before this node has validated it. Buffered votes are keyed
//! by candidate hash, one per voter (newest timestamp wins), and replayed
//! when the election starts.
//!
//! The buffer is bounded by the total number of buffered votes. Under
//! pressure, whole groups are evicted starting from the least recently
//! written, and every evicted vote is handed to the caller's callback.

use quorum_types::{PublicKey, TxHash};
use std::collections::{BTreeMap, HashMap};

use crate::vote::Vote;

struct BufferGroup {
    /// Sequence of the last write, the group's key in `order`.
    sequence: u64,
    votes: HashMap<PublicKey, Vote>,
}

pub struct VoteBuffer {
    groups: HashMap<TxHash, BufferGroup>,
    order: BTreeMap<u64, TxHash>,
    size: usize,
    max_size: usize,
    next_sequence: u64,
}

impl VoteBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            groups: HashMap::new(),
            order: BTreeMap::new(),
            size: 0,
            max_size,
            next_sequence: 0,
        }
    }

    /// Buffer a vote. Returns `false`, leaving the buffer untouched, when the
    /// voter already has an equal or newer vote buffered for the same hash.
    /// Votes evicted to stay within capacity are passed to `on_evict`.
    pub fn insert(&mut self, vote: Vote, mut on_evict: impl FnMut(Vote)) -> bool {
        let stale = self
            .groups
            .get(&vote.hash)
            .and_then(|g| g.votes.get(&vote.public_key))
            .is_some_and(|existing| existing.timestamp >= vote.timestamp);
        if stale {
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let group = self.groups.entry(vote.hash).or_insert_with(|| BufferGroup {
            sequence,
            votes: HashMap::new(),
        });
        self.order.remove(&group.sequence);
        group.sequence = sequence;
        self.order.insert(sequence, vote.hash);
        if group.votes.insert(vote.public_key, vote).is_none() {
            self.size += 1;
        }

        while self.size > self.max_size {
            let Some((_, hash)) = self.order.pop_first() else {
                break;
            };
            if let Some(evicted) = self.groups.remove(&hash) {
                self.size -= evicted.votes.len();
                evicted.votes.into_values().for_each(&mut on_evict);
            }
        }
        true
    }

    /// Take every vote buffered for `hash`.
    pub fn remove(&mut self, hash: &TxHash) -> Vec<Vote> {
        match self.groups.remove(hash) {
            Some(group) => {
                self.order.remove(&group.sequence);
                self.size -= group.votes.len();
                group.votes.into_values().collect()
            }
            None => Vec::new(),
        }
    }

    /// Number of buffered votes across all groups.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of distinct candidate hashes with buffered votes.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.order.clear();
        self.size = 0;
    }
}
