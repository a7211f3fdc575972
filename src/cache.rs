use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
    time::{Duration, Instant},
};

/// Expiry and size limits shared by the query cache and the dataset cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CachePolicy {
    pub(crate) ttl: Duration,
    pub(crate) max_entries: usize,
    /// How many of the oldest entries are dropped once `max_entries` is exceeded.
    pub(crate) evict_batch: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_entries: 50,
            evict_batch: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    pub(crate) value: V,
    pub(crate) stored_at: Instant,
}

impl<V> CacheEntry<V> {
    pub(crate) fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

/// A bounded key-value store whose entries expire after a fixed time-to-live.
///
/// Eviction follows insertion order rather than access order: re-inserting a
/// key moves it to the back, reading it does not.
#[derive(Debug)]
pub(crate) struct TtlCache<K, V> {
    policy: CachePolicy,
    entries: HashMap<K, CacheEntry<V>>,
    order: VecDeque<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns the live entry for `key`, dropping it first if it has expired.
    pub(crate) fn get(&mut self, key: &K) -> Option<&CacheEntry<V>> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<&CacheEntry<V>> {
        let stored_at = self.entries.get(key)?.stored_at;
        if now.saturating_duration_since(stored_at) > self.policy.ttl {
            self.remove(key);
            return None;
        }
        self.entries.get(key)
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        let entry = CacheEntry {
            value,
            stored_at: now,
        };
        if self.entries.insert(key.clone(), entry).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        if self.entries.len() > self.policy.max_entries {
            self.evict_oldest();
        }
    }

    fn remove(&mut self, key: &K) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }

    fn evict_oldest(&mut self) {
        for _ in 0..self.policy.evict_batch {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&key);
        }
    }
}
