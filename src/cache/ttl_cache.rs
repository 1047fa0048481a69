use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Key-value cache with one fixed time-to-live for every entry.
///
/// Expired entries are removed lazily by the `get` that finds them; there is
/// no background sweep. Clones share the same storage.
#[derive(Debug)]
pub struct TtlCache<K: Clone + Eq + Hash, V> {
    data: Arc<DashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.data.get(key) {
            if !entry.is_expired(self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }

        // The condition is re-checked under the shard lock so a fresh entry
        // written by a concurrent `put` survives.
        if self
            .data
            .remove_if(key, |_, entry| entry.is_expired(self.ttl))
            .is_some()
        {
            debug!("⏰ Expired cache entry removed");
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores `value`, replacing any previous entry for `key`.
    pub fn put(&self, key: K, value: V) {
        self.data.insert(key, CacheEntry::new(value));
    }

    /// Stores `value` unless a fresh entry already exists. Returns whether it was written.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        match self.data.entry(key) {
            Entry::Occupied(entry) if !entry.get().is_expired(self.ttl) => false,
            Entry::Occupied(mut entry) => {
                entry.insert(CacheEntry::new(value));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(CacheEntry::new(value));
                true
            }
        }
    }

    /// Number of stored keys, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<K, V> Clone for TtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            ttl: self.ttl,
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_get_after_put_returns_payload() {
        let cache: TtlCache<String, Vec<u32>> = TtlCache::new(Duration::from_secs(60));
        cache.put("k".to_string(), vec![1, 2, 3]);

        assert_eq!(cache.get(&"k".to_string()), Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&"missing".to_string()), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }

    #[test]
    fn test_expired_entry_is_removed_on_get() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_millis(30));
        cache.put("old", 1);
        cache.put("other", 2);
        assert_eq!(cache.len(), 2);

        sleep(Duration::from_millis(60));
        cache.put("fresh", 3);

        assert_eq!(cache.get(&"old"), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"fresh"), Some(3));
    }

    #[test]
    fn test_put_overwrites_unconditionally() {
        let cache: TtlCache<u8, &'static str> = TtlCache::new(Duration::from_secs(60));
        cache.put(1, "first");
        cache.put(1, "second");
        assert_eq!(cache.get(&1), Some("second"));
    }

    #[test]
    fn test_put_if_absent_keeps_first_fresh_writer() {
        let cache: TtlCache<u8, &'static str> = TtlCache::new(Duration::from_millis(30));
        assert!(cache.put_if_absent(1, "winner"));
        assert!(!cache.put_if_absent(1, "loser"));
        assert_eq!(cache.get(&1), Some("winner"));

        sleep(Duration::from_millis(60));
        assert!(cache.put_if_absent(1, "after expiry"));
        assert_eq!(cache.get(&1), Some("after expiry"));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(60));
        let shared = cache.clone();
        shared.put(7, 42);
        assert_eq!(cache.get(&7), Some(42));
        assert_eq!(cache.metrics().hits, 1);
    }

    #[test]
    fn test_concurrent_writers_leave_one_entry_per_key() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(60));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let mut wins = 0;
                    for key in 0..100 {
                        if cache.put_if_absent(key, worker) {
                            wins += 1;
                        }
                    }
                    wins
                })
            })
            .collect();

        let total_wins: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total_wins, 100);
        assert_eq!(cache.len(), 100);
    }
}
