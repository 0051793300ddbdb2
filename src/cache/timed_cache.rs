//! Time-based cache with TTL (Time To Live) support.
//!
//! Price lookups are cached per normalized query. Reads past the TTL are
//! misses; expired entries stay in the map until the periodic sweep removes
//! them with a full scan.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// A thread-safe cache with time-based expiration.
///
/// Cloning is cheap and clones share the same underlying map, so a handle can
/// be given to a background sweeper while the owning service keeps another.
#[derive(Clone)]
pub struct TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new TimedCache with the specified TTL in seconds.
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_seconds))
    }

    /// Create a new TimedCache with an arbitrary TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Insert a value, replacing any previous entry and resetting its age.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, entry);
        }
    }

    /// Get a value from the cache if it exists and hasn't expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Ok(cache) = self.cache.read() {
            if let Some(entry) = cache.get(key) {
                if now.duration_since(entry.inserted_at) < self.ttl {
                    return Some(entry.value.clone());
                }
            }
        }

        None
    }

    /// Remove all expired entries and return how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();

        if let Ok(mut cache) = self.cache.write() {
            let before = cache.len();
            cache.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
            before - cache.len()
        } else {
            0
        }
    }

    /// Number of entries in the cache, expired ones included.
    pub fn len(&self) -> usize {
        if let Ok(cache) = self.cache.read() {
            cache.len()
        } else {
            0
        }
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the TTL duration for this cache.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Spawn a background task that sweeps expired entries every `period`.
    ///
    /// The task runs until the returned handle is aborted. Must be called
    /// from within a tokio runtime.
    pub fn spawn_sweeper(&self, name: &'static str, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    tracing::debug!(cache = name, removed, "Swept expired cache entries");
                }
            }
        })
    }
}

impl<K, V> std::fmt::Debug for TimedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_insert_and_get() {
        let cache = TimedCache::new(60);
        cache.insert("key1", "value1");

        assert_eq!(cache.get(&"key1"), Some("value1"));
        assert_eq!(cache.get(&"key2"), None);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = TimedCache::with_ttl(Duration::from_millis(50));
        cache.insert("key1", "value1");

        assert_eq!(cache.get(&"key1"), Some("value1"));

        thread::sleep(Duration::from_millis(80));

        assert_eq!(cache.get(&"key1"), None);
        // expired but still stored until swept
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_expired_keeps_fresh_entries() {
        let cache = TimedCache::with_ttl(Duration::from_millis(60));
        cache.insert("old".to_string(), 1);

        thread::sleep(Duration::from_millis(90));
        cache.insert("new".to_string(), 2);

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new".to_string()), Some(2));
    }

    #[test]
    fn test_reinsert_resets_age() {
        let cache = TimedCache::with_ttl(Duration::from_millis(100));
        cache.insert("key1", "value1");
        thread::sleep(Duration::from_millis(60));
        cache.insert("key1", "value2");
        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get(&"key1"), Some("value2"));
    }

    #[test]
    fn test_clone_shares_entries() {
        let cache1 = TimedCache::new(60);
        cache1.insert("key1", "value1");

        let cache2 = cache1.clone();
        assert_eq!(cache2.get(&"key1"), Some("value1"));

        cache2.insert("key2", "value2");
        assert_eq!(cache1.get(&"key2"), Some("value2"));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = TimedCache::new(60);
        let cache_clone = cache.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                cache_clone.insert(format!("key{}", i), i);
            }
        });

        for i in 100..200 {
            cache.insert(format!("key{}", i), i);
        }

        handle.join().unwrap();
        assert_eq!(cache.len(), 200);
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = TimedCache::with_ttl(Duration::from_millis(20));
        cache.insert("key1".to_string(), 1u32);

        let handle = cache.spawn_sweeper("test", Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(cache.is_empty());
    }

    #[test]
    fn test_debug_format() {
        let cache = TimedCache::new(60);
        cache.insert("key1", "value1");

        let debug_str = format!("{:?}", cache);
        assert!(debug_str.contains("TimedCache"));
        assert!(debug_str.contains("entries"));
    }
}
