// ── Counter cache ──
//
// Previous readings per (target, interface). Owned by the poll loop and
// lent to the sampler; only written between cycles, so it needs no lock.

use std::collections::{HashMap, HashSet};

use crate::model::Interface;

/// Cache key: target id, interface name and the counter identifiers the
/// baseline was read from. Re-pointing an interface at other counters
/// yields a new key, so the old baseline is never diffed against them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub target: String,
    pub interface: String,
    pub in_counter: String,
    pub out_counter: String,
}

impl CacheKey {
    pub fn new(target: &str, interface: &Interface) -> Self {
        Self {
            target: target.to_owned(),
            interface: interface.name.clone(),
            in_counter: interface.in_counter.clone(),
            out_counter: interface.out_counter.clone(),
        }
    }
}

/// Last observed counters of one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub in_octets: u64,
    pub out_octets: u64,
    /// Unix epoch milliseconds of the observation.
    pub observed_at_ms: i64,
}

#[derive(Debug, Default)]
pub struct CounterCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl CounterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose key is not in `live`. Returns how many were
    /// evicted.
    pub fn retain_keys(&mut self, live: &HashSet<CacheKey>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| live.contains(key));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(target: &str, interface: &str) -> CacheKey {
        CacheKey::new(target, &Interface::new(interface, "1.1", "1.2"))
    }

    #[test]
    fn eviction_keeps_live_keys_only() {
        let mut cache = CounterCache::new();
        let entry = CacheEntry {
            in_octets: 1,
            out_octets: 2,
            observed_at_ms: 3,
        };
        cache.insert(key("a", "eth0"), entry);
        cache.insert(key("a", "eth1"), entry);
        cache.insert(key("b", "eth0"), entry);

        let live = HashSet::from([key("a", "eth0")]);
        assert_eq!(cache.retain_keys(&live), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("a", "eth0")).is_some());
        assert_eq!(cache.retain_keys(&live), 0);
    }

    #[test]
    fn remapped_counters_are_a_different_key() {
        let before = Interface::new("eth0", "1.1", "1.2");
        let after = Interface::new("eth0", "1.3", "1.4");
        assert_ne!(CacheKey::new("a", &before), CacheKey::new("a", &after));

        let mut cache = CounterCache::new();
        cache.insert(
            CacheKey::new("a", &before),
            CacheEntry {
                in_octets: 1,
                out_octets: 1,
                observed_at_ms: 0,
            },
        );
        let live = HashSet::from([CacheKey::new("a", &after)]);
        assert_eq!(cache.retain_keys(&live), 1);
        assert!(cache.is_empty());
    }
}
