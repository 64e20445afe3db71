//! Thread-safe map from a key to a non-empty, insertion-ordered list
//!
//! A key is present iff its list is non-empty: every mutation that empties a
//! list deletes the key in the same critical section.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use super::{read_lock, write_lock};

#[derive(Debug)]
pub struct KeyedLists<K, V> {
    lists: RwLock<HashMap<K, Vec<V>>>,
}

impl<K, V> Default for KeyedLists<K, V> {
    fn default() -> Self {
        Self {
            lists: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> KeyedLists<K, V>
where
    K: Eq + Hash + Copy,
    V: PartialEq + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `key`
    ///
    /// Adding a value already listed is a caller bug: debug builds assert,
    /// release builds return false and leave the list unchanged.
    pub fn add(&self, key: K, value: V) -> bool {
        let mut lists = write_lock(&self.lists);
        let list = lists.entry(key).or_default();
        if list.contains(&value) {
            debug_assert!(false, "KeyedLists::add: value already listed");
            return false;
        }
        list.push(value);
        true
    }

    /// Remove `value` from `key`'s list, deleting the key if it empties
    ///
    /// Returns whether the value was listed.
    pub fn remove(&self, key: K, value: V) -> bool {
        let mut lists = write_lock(&self.lists);
        let Some(list) = lists.get_mut(&key) else {
            return false;
        };
        let Some(index) = list.iter().position(|v| *v == value) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            lists.remove(&key);
        }
        true
    }

    /// Remove a key and everything listed under it
    pub fn remove_key(&self, key: K) -> Option<Vec<V>> {
        write_lock(&self.lists).remove(&key)
    }

    /// Snapshot of `key`'s list
    pub fn get(&self, key: K) -> Option<Vec<V>> {
        read_lock(&self.lists).get(&key).cloned()
    }

    /// Length of `key`'s list (0 for an absent key)
    pub fn count(&self, key: K) -> usize {
        read_lock(&self.lists).get(&key).map_or(0, Vec::len)
    }

    pub fn contains_key(&self, key: K) -> bool {
        read_lock(&self.lists).contains_key(&key)
    }

    /// Number of keys
    pub fn key_count(&self) -> usize {
        read_lock(&self.lists).len()
    }

    /// Sum of all list lengths
    pub fn total_count(&self) -> usize {
        read_lock(&self.lists).values().map(Vec::len).sum()
    }

    pub fn keys(&self) -> Vec<K> {
        read_lock(&self.lists).keys().copied().collect()
    }

    pub fn clear(&self) {
        write_lock(&self.lists).clear();
    }
}
