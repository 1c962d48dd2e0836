use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Process-wide map whose entries expire a fixed time after insertion.
/// Expired entries are dropped when read; there is no other eviction.
/// Clones share the same storage.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: Arc<DashMap<K, Entry<V>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            ttl: self.ttl,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                metrics::counter!("cache_hits_total", "cache" => self.name).increment(1);
                return Some(entry.value.clone());
            }
        }

        self.entries
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        metrics::counter!("cache_misses_total", "cache" => self.name).increment(1);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!(cache = self.name, "cache cleared");
    }
}
