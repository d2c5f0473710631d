// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! TTL snapshot cache.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Keyed store of immutable `Arc` snapshots backed by `moka`.
//!   Writers replace a whole entry; readers clone the `Arc`. Entries past
//!   their time-to-live are never returned.

use moka::sync::Cache;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

pub struct SnapshotCache<K, V> {
    entries: Cache<K, Arc<V>>,
}

impl<K, V> SnapshotCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Fresh snapshot for `key`, if any.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key)
    }

    /// Stores `value` as the only snapshot for `key`.
    pub fn replace(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_get() {
        let cache: SnapshotCache<String, Vec<u32>> = SnapshotCache::new(Duration::from_secs(60));
        assert!(cache.get(&"a".to_string()).is_none());

        cache.replace("a".to_string(), vec![1, 2, 3]);
        let held = cache.get(&"a".to_string()).unwrap();

        cache.replace("a".to_string(), vec![4]);
        assert_eq!(*cache.get(&"a".to_string()).unwrap(), vec![4]);
        // readers keep the snapshot they already hold
        assert_eq!(*held, vec![1, 2, 3]);
    }

    #[test]
    fn test_expired_entries_are_not_served() {
        let cache: SnapshotCache<&'static str, u8> = SnapshotCache::new(Duration::from_millis(20));
        cache.replace("k", 1);
        assert_eq!(cache.get(&"k").as_deref(), Some(&1));
        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get(&"k").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache: SnapshotCache<&'static str, u8> = SnapshotCache::new(Duration::from_secs(60));
        cache.replace("a", 1);
        cache.replace("b", 2);
        assert!(cache.invalidate(&"a"));
        assert!(!cache.invalidate(&"a"));
        assert!(cache.get(&"b").is_some());
        cache.invalidate_all();
        assert!(cache.get(&"b").is_none());
    }
}
