/// Bounded in-memory response cache owned by the façade
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Composite key: operation, adapter/body, raw coordinates, optional date.
///
/// Coordinates are formatted unrounded, so `10.0` and `10.000001` are
/// distinct keys.
pub fn cache_key(op: &str, scope: &str, lat: f64, lon: f64, date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("{}:{}:{}:{}:{}", op, scope, lat, lon, d),
        None => format!("{}:{}:{}:{}", op, scope, lat, lon),
    }
}

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// TTL plus max-entries cache; the oldest entry is evicted on overflow
pub struct ResponseCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.purge_expired();
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn insert(&mut self, key: String, value: V) {
        self.purge_expired();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.created_at.elapsed() <= ttl);
    }
}
