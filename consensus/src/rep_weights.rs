//! Representative weights, the source of every vote's weight.
//!
//! Weights are supplied by the surrounding system; the cache only sums what
//! each representative has been credited with.

use quorum_types::{Amount, PublicKey};
use std::collections::HashMap;

/// Share of total online weight a candidate needs to confirm, in basis points.
pub const CONFIRMATION_THRESHOLD_BPS: u128 = 6_700;

/// Answers how much weight a voter carries and what a candidate needs to confirm.
pub trait VoteWeightService: Send + Sync {
    /// Current weight of a voter; zero when unknown.
    fn weight_of(&self, voter: &PublicKey) -> Amount;

    /// Total weight a candidate must accumulate, for plain or final votes.
    fn minimal_confirmation_weight(&self) -> Amount;
}

/// Representative weights and their total.
#[derive(Debug, Clone, Default)]
pub struct RepWeightCache {
    weights: HashMap<PublicKey, Amount>,
    total_weight: Amount,
}

impl RepWeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weight to a representative (when an account delegates to them).
    pub fn add_weight(&mut self, rep: &PublicKey, weight: Amount) {
        let entry = self.weights.entry(*rep).or_default();
        *entry = entry.saturating_add(weight);
        self.total_weight = self.total_weight.saturating_add(weight);
    }

    /// Weight credited to `rep`; zero when unknown.
    pub fn weight(&self, rep: &PublicKey) -> Amount {
        self.weights.get(rep).copied().unwrap_or_default()
    }

    pub fn total_weight(&self) -> Amount {
        self.total_weight
    }
}

impl VoteWeightService for RepWeightCache {
    fn weight_of(&self, voter: &PublicKey) -> Amount {
        self.weight(voter)
    }

    fn minimal_confirmation_weight(&self) -> Amount {
        self.total_weight.mul_bps(CONFIRMATION_THRESHOLD_BPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(id: u8) -> PublicKey {
        PublicKey([id; 32])
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = RepWeightCache::new();
        assert_eq!(cache.total_weight(), Amount::MIN);
        assert_eq!(cache.weight(&rep(1)), Amount::MIN);
    }

    #[test]
    fn add_weight_accumulates() {
        let mut cache = RepWeightCache::new();
        cache.add_weight(&rep(1), Amount::new(100));
        cache.add_weight(&rep(1), Amount::new(50));
        cache.add_weight(&rep(2), Amount::new(25));

        assert_eq!(cache.weight(&rep(1)), Amount::new(150));
        assert_eq!(cache.weight(&rep(2)), Amount::new(25));
        assert_eq!(cache.total_weight(), Amount::new(175));
    }

    #[test]
    fn confirmation_threshold_is_two_thirds_plus() {
        let mut cache = RepWeightCache::new();
        cache.add_weight(&rep(1), Amount::new(10_000));
        assert_eq!(cache.minimal_confirmation_weight(), Amount::new(6_700));
        assert_eq!(cache.weight_of(&rep(1)), Amount::new(10_000));
    }

    #[test]
    fn add_weight_saturates() {
        let mut cache = RepWeightCache::new();
        cache.add_weight(&rep(1), Amount::MAX);
        cache.add_weight(&rep(2), Amount::new(1));
        assert_eq!(cache.total_weight(), Amount::MAX);
    }
}
