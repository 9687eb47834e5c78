//! Vote prioritizer: the front door for votes on their way to elections.
//!
//! Admission filters duplicates, weightless voters and votes for rejected
//! transactions. Votes for open elections enter the weight-ordered
//! [`VoteQueue`]; votes for candidates not yet observed wait in the
//! [`VoteBuffer`] until their election starts.
//!
//! Every outcome other than queueing is reported as a [`VoteEvent`].

use quorum_types::{Signature, TxHash};
use std::collections::HashMap;

use crate::recent_set::RecentSet;
use crate::transaction::Transaction;
use crate::vote::{TransactionVote, Vote, VoteDropReason, VoteRejectionReason};
use crate::vote_buffer::VoteBuffer;
use crate::vote_queue::VoteQueue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrioritizerConfig {
    pub queue_max_size: usize,
    /// Total buffered votes across all candidates.
    pub buffer_max_size: usize,
    pub rejected_cache_size: usize,
    pub duplicate_window_size: usize,
}

impl Default for PrioritizerConfig {
    fn default() -> Self {
        Self {
            queue_max_size: 5_000,
            buffer_max_size: 10_000,
            rejected_cache_size: 10_000,
            duplicate_window_size: 65_536,
        }
    }
}

/// A vote that did not make it to an election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteEvent {
    Dropped { vote: Vote, reason: VoteDropReason },
    Rejected { vote: Vote, reason: VoteRejectionReason },
}

impl VoteEvent {
    pub fn vote(&self) -> &Vote {
        match self {
            Self::Dropped { vote, .. } | Self::Rejected { vote, .. } => vote,
        }
    }
}

pub struct VotePrioritizer {
    queue: VoteQueue,
    buffer: VoteBuffer,
    /// Candidates with an open election, by hash.
    active_elections: HashMap<TxHash, Transaction>,
    duplicates: RecentSet<Signature>,
    rejected: RecentSet<TxHash>,
}

impl VotePrioritizer {
    pub fn new(config: &PrioritizerConfig) -> Self {
        Self {
            queue: VoteQueue::new(config.queue_max_size),
            buffer: VoteBuffer::new(config.buffer_max_size),
            active_elections: HashMap::new(),
            duplicates: RecentSet::new(config.duplicate_window_size),
            rejected: RecentSet::new(config.rejected_cache_size),
        }
    }

    /// Admit an incoming vote.
    pub fn admit(&mut self, vote: Vote) -> Vec<VoteEvent> {
        if self.duplicates.is_duplicate(&vote.signature) {
            tracing::trace!(hash = %vote.hash, voter = %vote.public_key, "duplicate vote ignored");
            return Vec::new();
        }

        if vote.weight.is_zero() {
            return vec![VoteEvent::Rejected {
                vote,
                reason: VoteRejectionReason::InvalidVotingWeight,
            }];
        }

        if self.rejected.contains(&vote.hash) {
            return vec![VoteEvent::Dropped {
                vote,
                reason: VoteDropReason::TransactionDropped,
            }];
        }

        let mut events = Vec::new();
        match self.active_elections.get(&vote.hash) {
            Some(transaction) => {
                let entry = TransactionVote::new(transaction.clone(), vote);
                self.enqueue(entry, &mut events);
            }
            None => {
                tracing::trace!(hash = %vote.hash, voter = %vote.public_key, "buffered until election starts");
                let stale = vote.clone();
                let inserted = self.buffer.insert(vote, |evicted| {
                    events.push(VoteEvent::Dropped {
                        vote: evicted,
                        reason: VoteDropReason::NoElection,
                    })
                });
                if !inserted {
                    events.push(VoteEvent::Dropped {
                        vote: stale,
                        reason: VoteDropReason::Superseded,
                    });
                }
            }
        }
        events
    }

    /// An election opened for `transaction`; replay its buffered votes.
    pub fn election_started(&mut self, transaction: Transaction) -> Vec<VoteEvent> {
        let hash = transaction.hash;
        let buffered = self.buffer.remove(&hash);
        let mut events = Vec::new();
        if !buffered.is_empty() {
            tracing::trace!(%hash, votes = buffered.len(), "replaying buffered votes");
        }
        for vote in buffered {
            self.enqueue(TransactionVote::new(transaction.clone(), vote), &mut events);
        }
        self.active_elections.insert(hash, transaction);
        events
    }

    /// Validation refused the transaction; its pending votes are dropped and
    /// later ones are turned away.
    pub fn transaction_rejected(&mut self, hash: TxHash) -> Vec<VoteEvent> {
        self.rejected.insert(hash);
        self.active_elections.remove(&hash);
        self.buffer
            .remove(&hash)
            .into_iter()
            .map(|vote| VoteEvent::Dropped {
                vote,
                reason: VoteDropReason::TransactionDropped,
            })
            .collect()
    }

    /// The transaction was persisted as confirmed, or retired as a losing fork.
    pub fn transaction_saved(&mut self, hash: &TxHash) {
        self.active_elections.remove(hash);
    }

    pub fn election_expired(&mut self, hash: &TxHash) {
        self.active_elections.remove(hash);
    }

    /// Next vote to hand to the election, heaviest first.
    pub fn poll(&mut self) -> Option<TransactionVote> {
        self.queue.poll()
    }

    fn enqueue(&mut self, entry: TransactionVote, events: &mut Vec<VoteEvent>) {
        if let Some(dropped) = self.queue.add(entry) {
            events.push(VoteEvent::Dropped {
                vote: dropped.vote,
                reason: VoteDropReason::Superseded,
            });
        }
    }

    pub fn is_active(&self, hash: &TxHash) -> bool {
        self.active_elections.contains_key(hash)
    }

    pub fn active_len(&self) -> usize {
        self.active_elections.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Buffered votes across all candidates.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_groups(&self) -> usize {
        self.buffer.group_count()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.buffer.clear();
        self.active_elections.clear();
        self.duplicates.clear();
        self.rejected.clear();
    }
}
