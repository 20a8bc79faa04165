//! Bounded bookkeeping for idempotent reducers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Insertion-ordered set that forgets its oldest entries past `capacity`.
#[derive(Debug)]
pub(crate) struct RecentSet<K> {
    capacity: usize,
    order: VecDeque<K>,
    members: HashSet<K>,
}

impl<K: Clone + Eq + Hash> RecentSet<K> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    /// Returns `false` when the key was already present.
    pub(crate) fn insert(&mut self, key: K) -> bool {
        if !self.members.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.members.remove(&old);
            }
        }
        true
    }
}

/// Insertion-ordered map with the same eviction rule.
#[derive(Debug)]
pub(crate) struct RecentMap<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K: Clone + Eq + Hash, V> RecentMap<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    /// Insert or replace. A replaced key keeps its age.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_rejects_duplicates() {
        let mut set = RecentSet::new(4);
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
    }

    #[test]
    fn test_set_evicts_oldest() {
        let mut set = RecentSet::new(2);
        set.insert(1);
        set.insert(2);
        set.insert(3);
        assert!(set.insert(1));
        assert!(!set.insert(3));
    }

    #[test]
    fn test_map_evicts_oldest() {
        let mut map = RecentMap::new(2);
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 10);
        map.insert("c", 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map.remove(&"a"), None);
        assert_eq!(map.remove(&"b"), Some(2));
        assert_eq!(map.remove(&"c"), Some(3));
    }
}
