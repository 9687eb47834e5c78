//! Bounded FIFO set of recently seen items.
//!
//! When full, the oldest entry is evicted to make room for a new insertion.
//! Lookups are O(1) via a `HashSet`. Used for duplicate vote signatures,
//! rejected transactions and recently confirmed slots.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct RecentSet<T> {
    set: HashSet<T>,
    order: VecDeque<T>,
    capacity: usize,
}

impl<T: Eq + Hash + Clone> RecentSet<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            set: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an item, evicting the oldest entry if at capacity.
    /// Returns `false` if the item was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.capacity == 0 || self.set.contains(&item) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        self.set.insert(item.clone());
        self.order.push_back(item);
        true
    }

    /// Record the item and report whether it had been seen before.
    pub fn is_duplicate(&mut self, item: &T) -> bool {
        !self.insert(item.clone())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.set.contains(item)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let mut set = RecentSet::new(10);
        assert!(!set.contains(&1u32));
        assert!(set.insert(1));
        assert!(set.contains(&1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut set = RecentSet::new(10);
        assert!(set.insert(1u32));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut set = RecentSet::new(3);
        for i in 0u32..4 {
            set.insert(i);
        }
        assert!(!set.contains(&0));
        assert!(set.contains(&1));
        assert!(set.contains(&3));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn is_duplicate_records_first_sighting() {
        let mut set = RecentSet::new(4);
        assert!(!set.is_duplicate(&"a"));
        assert!(set.is_duplicate(&"a"));
    }

    #[test]
    fn zero_capacity_never_stores() {
        let mut set = RecentSet::new(0);
        assert!(!set.insert(1u32));
        assert!(set.is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut set = RecentSet::new(2);
        set.insert(1u32);
        set.clear();
        assert!(set.is_empty());
        assert!(set.insert(1));
    }
}
