//! Election set: the authoritative per-slot consensus tracker.
//!
//! Every validated transaction is observed as a candidate for its
//! `(account, height)` slot. Forks of the same slot form one group. Votes are
//! folded into the group, the leader is recomputed, and the group is retired
//! once final votes for one candidate reach the confirmation weight or the
//! election times out.
//!
//! Per slot: `Observing -> Agreed -> Confirmed`, with `Staled` reachable from
//! either non-terminal state. Retired slots never reopen from votes; confirmed
//! slots are also remembered so a late re-observation does not reopen them.
//!
//! This type is a plain state machine. Callers serialize access to it.

use quorum_types::{Slot, Timestamp, TxHash};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::recent_set::RecentSet;
use crate::rep_weights::VoteWeightService;
use crate::transaction::Transaction;
use crate::vote::Vote;
use crate::weighter::TransactionWeighter;

/// Lifecycle notification for one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElectionEvent {
    /// A new candidate joined its slot's election.
    Started {
        transaction: Transaction,
        /// The slot's leader after the candidate joined.
        leader: Transaction,
    },
    /// The slot's leading candidate changed.
    ConsensusChanged { transaction: Transaction },
    /// A candidate's total weight reached the confirmation weight. Fires at
    /// most once per slot.
    AgreementReached { transaction: Transaction },
    /// Final votes for a candidate reached the confirmation weight. The slot
    /// is retired.
    Confirmed {
        transaction: Transaction,
        /// The final votes that confirmed it, ordered by voter.
        votes: Vec<Vote>,
        /// Hashes of the losing candidates retired with the slot.
        forks: Vec<TxHash>,
    },
    /// The election is taking long; carries the current leader.
    Staling { transaction: Transaction },
    /// The election timed out; one event per retired candidate.
    Staled { transaction: Transaction },
}

impl ElectionEvent {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Started { transaction, .. }
            | Self::ConsensusChanged { transaction }
            | Self::AgreementReached { transaction }
            | Self::Confirmed { transaction, .. }
            | Self::Staling { transaction }
            | Self::Staled { transaction } => transaction,
        }
    }

    pub fn slot(&self) -> Slot {
        self.transaction().slot()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::ConsensusChanged { .. } => "consensus_changed",
            Self::AgreementReached { .. } => "agreement_reached",
            Self::Confirmed { .. } => "confirmed",
            Self::Staling { .. } => "staling",
            Self::Staled { .. } => "staled",
        }
    }
}

/// Competing candidates for one slot.
#[derive(Debug, Clone)]
struct ElectionGroup {
    candidates: BTreeMap<TxHash, TransactionWeighter>,
    /// Last leader reported to observers.
    leader: TxHash,
    agreed: bool,
    /// Earliest `received_at` among the candidates.
    started_at: Timestamp,
}

impl ElectionGroup {
    fn new(transaction: Transaction) -> Self {
        let hash = transaction.hash;
        let started_at = transaction.received_at;
        let mut candidates = BTreeMap::new();
        candidates.insert(hash, TransactionWeighter::new(transaction));
        Self {
            candidates,
            leader: hash,
            agreed: false,
            started_at,
        }
    }

    /// Candidate with the greatest total weight; equal weights resolve to the
    /// smallest hash.
    fn compute_leader(&self) -> Option<&TransactionWeighter> {
        self.candidates.values().max_by(|a, b| {
            a.total_weight()
                .cmp(&b.total_weight())
                .then_with(|| b.transaction().hash.cmp(&a.transaction().hash))
        })
    }

    fn leader_transaction(&self) -> Option<&Transaction> {
        self.candidates.get(&self.leader).map(|w| w.transaction())
    }

    /// Whether any candidate already holds a vote from this voter at least as
    /// recent as `vote`.
    fn supersedes(&self, vote: &Vote) -> bool {
        self.candidates
            .values()
            .filter_map(|w| w.vote_of(&vote.public_key))
            .any(|existing| existing.timestamp >= vote.timestamp)
    }

    /// Recompute the leader and report it if it changed.
    fn refresh_leader(&mut self) -> Option<Transaction> {
        let leader = self.compute_leader()?.transaction().clone();
        if leader.hash == self.leader {
            return None;
        }
        self.leader = leader.hash;
        Some(leader)
    }
}

pub struct Election {
    groups: BTreeMap<Slot, ElectionGroup>,
    slots: HashMap<TxHash, Slot>,
    recently_confirmed: RecentSet<Slot>,
    weights: Arc<dyn VoteWeightService>,
}

impl Election {
    pub fn new(weights: Arc<dyn VoteWeightService>, recently_confirmed_size: usize) -> Self {
        Self {
            groups: BTreeMap::new(),
            slots: HashMap::new(),
            recently_confirmed: RecentSet::new(recently_confirmed_size),
            weights,
        }
    }

    /// Register a validated transaction as a candidate for its slot.
    ///
    /// Already observed candidates and recently confirmed slots are ignored.
    pub fn observe(&mut self, transaction: Transaction) -> Vec<ElectionEvent> {
        let slot = transaction.slot();
        if self.recently_confirmed.contains(&slot) {
            tracing::trace!(hash = %transaction.hash, %slot, "slot already confirmed, not observing");
            return Vec::new();
        }
        if self.slots.contains_key(&transaction.hash) {
            return Vec::new();
        }

        self.slots.insert(transaction.hash, slot);
        let mut events = Vec::with_capacity(2);

        let group = match self.groups.entry(slot) {
            Entry::Occupied(entry) => {
                let group = entry.into_mut();
                group.started_at = group.started_at.min(transaction.received_at);
                group
                    .candidates
                    .insert(transaction.hash, TransactionWeighter::new(transaction.clone()));
                tracing::debug!(hash = %transaction.hash, %slot, candidates = group.candidates.len(), "fork joined election");
                group
            }
            Entry::Vacant(entry) => {
                tracing::debug!(hash = %transaction.hash, %slot, "election started");
                entry.insert(ElectionGroup::new(transaction.clone()))
            }
        };

        let changed = group.refresh_leader();
        let Some(leader) = group.leader_transaction().cloned() else {
            return events;
        };
        events.push(ElectionEvent::Started {
            transaction,
            leader,
        });
        if let Some(transaction) = changed {
            events.push(ElectionEvent::ConsensusChanged { transaction });
        }
        events
    }

    /// Fold a validated vote into its candidate's election.
    ///
    /// Votes for unknown candidates, and votes not newer than the voter's
    /// current vote anywhere in the slot, are discarded.
    pub fn process_vote(&mut self, vote: Vote) -> Vec<ElectionEvent> {
        let Some(slot) = self.slots.get(&vote.hash).copied() else {
            tracing::trace!(hash = %vote.hash, voter = %vote.public_key, "no election for vote, discarding");
            return Vec::new();
        };
        let Some(group) = self.groups.get_mut(&slot) else {
            tracing::error!(hash = %vote.hash, %slot, "candidate indexed without an election group");
            debug_assert!(false, "candidate {} indexed without group {}", vote.hash, slot);
            self.slots.remove(&vote.hash);
            return Vec::new();
        };

        if group.supersedes(&vote) {
            tracing::trace!(hash = %vote.hash, voter = %vote.public_key, timestamp = %vote.timestamp, "stale vote ignored");
            return Vec::new();
        }

        let hash = vote.hash;
        let voter = vote.public_key;
        let Some(weighter) = group.candidates.get_mut(&hash) else {
            tracing::error!(%hash, %slot, "candidate missing from its election group");
            debug_assert!(false, "candidate {} missing from group {}", hash, slot);
            return Vec::new();
        };
        weighter.add(vote);
        for (_, sibling) in group.candidates.iter_mut().filter(|(h, _)| **h != hash) {
            sibling.remove(&voter);
        }

        let mut events = Vec::new();
        if let Some(transaction) = group.refresh_leader() {
            tracing::debug!(hash = %transaction.hash, %slot, "consensus changed");
            events.push(ElectionEvent::ConsensusChanged { transaction });
        }

        let threshold = self.weights.minimal_confirmation_weight();
        let Some(weighter) = group.candidates.get(&hash) else {
            return events;
        };
        let transaction = weighter.transaction().clone();

        if !group.agreed && weighter.total_weight() >= threshold {
            group.agreed = true;
            tracing::debug!(%hash, %slot, weight = %weighter.total_weight(), "agreement reached");
            events.push(ElectionEvent::AgreementReached {
                transaction: transaction.clone(),
            });
        }

        if weighter.total_final_weight() >= threshold {
            let votes = weighter.final_votes();
            let final_weight = weighter.total_final_weight();
            let forks = self.retire(&slot, Some(&hash));
            self.recently_confirmed.insert(slot);
            tracing::info!(%hash, %slot, %final_weight, final_votes = votes.len(), "election confirmed");
            events.push(ElectionEvent::Confirmed {
                transaction,
                votes,
                forks,
            });
        }

        events
    }

    /// Emit a staling hint with the current leader for every election whose
    /// earliest candidate was received more than `staling_after` ago.
    pub fn process_staling(&self, now: Timestamp, staling_after: Duration) -> Vec<ElectionEvent> {
        let cutoff = now.saturating_sub(staling_after);
        let mut events = Vec::new();
        for (slot, group) in self.groups.iter().filter(|(_, g)| g.started_at < cutoff) {
            if let Some(leader) = group.compute_leader().map(|w| w.transaction()) {
                tracing::debug!(hash = %leader.hash, %slot, "election staling");
                events.push(ElectionEvent::Staling {
                    transaction: leader.clone(),
                });
            }
        }
        events
    }

    /// Retire every election whose earliest candidate was received more than
    /// `staled_after` ago.
    pub fn process_staled_expiry(
        &mut self,
        now: Timestamp,
        staled_after: Duration,
    ) -> Vec<ElectionEvent> {
        let cutoff = now.saturating_sub(staled_after);
        let expired: Vec<Slot> = self
            .groups
            .iter()
            .filter(|(_, g)| g.started_at < cutoff)
            .map(|(slot, _)| *slot)
            .collect();

        let mut events = Vec::new();
        for slot in expired {
            let Some(group) = self.groups.remove(&slot) else {
                continue;
            };
            tracing::debug!(%slot, candidates = group.candidates.len(), "election staled");
            for (hash, weighter) in group.candidates {
                self.slots.remove(&hash);
                events.push(ElectionEvent::Staled {
                    transaction: weighter.transaction().clone(),
                });
            }
        }
        events
    }

    /// Remove a slot's group and its candidate index entries. Returns the
    /// retired hashes other than `keep`.
    fn retire(&mut self, slot: &Slot, keep: Option<&TxHash>) -> Vec<TxHash> {
        let Some(group) = self.groups.remove(slot) else {
            return Vec::new();
        };
        group
            .candidates
            .into_keys()
            .inspect(|hash| {
                self.slots.remove(hash);
            })
            .filter(|hash| Some(hash) != keep)
            .collect()
    }

    /// Number of open elections (slots).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of candidates across all open elections.
    pub fn candidate_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_observing(&self, hash: &TxHash) -> bool {
        self.slots.contains_key(hash)
    }

    pub fn is_agreed(&self, slot: &Slot) -> bool {
        self.groups.get(slot).is_some_and(|g| g.agreed)
    }

    pub fn is_recently_confirmed(&self, slot: &Slot) -> bool {
        self.recently_confirmed.contains(slot)
    }

    /// The current vote tally for a candidate.
    pub fn weighter(&self, hash: &TxHash) -> Option<&TransactionWeighter> {
        let slot = self.slots.get(hash)?;
        self.groups.get(slot)?.candidates.get(hash)
    }

    /// Candidates competing for a slot, in hash order.
    pub fn candidates(&self, slot: &Slot) -> Vec<&TransactionWeighter> {
        self.groups
            .get(slot)
            .map(|g| g.candidates.values().collect())
            .unwrap_or_default()
    }

    /// The leading candidate for a slot.
    pub fn consensus(&self, slot: &Slot) -> Option<&Transaction> {
        self.groups.get(slot)?.compute_leader().map(|w| w.transaction())
    }

    /// Drop every open election and the confirmed-slot memory.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.slots.clear();
        self.recently_confirmed.clear();
    }
}
