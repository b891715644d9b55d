use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Shared in-memory cache with a fixed TTL and an entry cap.
///
/// Clones share the same storage, so a cache held by a cloned service is
/// visible to every fetch task. When `enable_metrics` is set, each operation
/// emits a `tracing::debug!` event with its elapsed time.
pub struct Cache<K, V> {
    entries: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    ttl: Duration,
    max_entries: usize,
    enable_metrics: bool,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_metrics(ttl, max_entries, false)
    }

    pub fn with_metrics(ttl: Duration, max_entries: usize, enable_metrics: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_entries: max_entries.max(1),
            enable_metrics,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let start = Instant::now();
        let entries = self.entries.read().ok()?;

        let hit = entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone());

        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), hit = hit.is_some(), "cache.get");
        }
        hit
    }

    /// Insert a value. When the cap is reached, expired entries are purged
    /// first and then the entry closest to expiry is evicted.
    pub fn set(&self, key: K, value: V) {
        let start = Instant::now();
        let Ok(mut entries) = self.entries.write() else {
            tracing::warn!("cache.set skipped: lock poisoned");
            return;
        };

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let now = Instant::now();
            entries.retain(|_, entry| now < entry.expires_at);

            if entries.len() >= self.max_entries
                && let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );

        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), size = entries.len(), "cache.set");
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let removed = entries.len();
            entries.clear();
            if self.enable_metrics {
                tracing::debug!(removed, "cache.clear");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
            max_entries: self.max_entries,
            enable_metrics: self.enable_metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cache_set_and_get() {
        let cache = Cache::new(Duration::from_secs(60), 8);
        cache.set("a".to_string(), 1);

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn test_cache_expiration() {
        let cache = Cache::new(Duration::from_millis(50), 8);
        cache.set(1, "page".to_string());
        assert_eq!(cache.get(&1), Some("page".to_string()));

        thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_cache_clear() {
        let cache = Cache::new(Duration::from_secs(60), 8);
        cache.set(1, 10);
        cache.set(2, 20);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_cache_evicts_when_full() {
        let cache = Cache::new(Duration::from_secs(60), 2);
        cache.set(1, "first");
        thread::sleep(Duration::from_millis(5));
        cache.set(2, "second");
        thread::sleep(Duration::from_millis(5));
        cache.set(3, "third");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&3), Some("third"));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = Cache::new(Duration::from_secs(60), 2);
        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(2, "c");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some("a"));
        assert_eq!(cache.get(&2), Some("c"));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = Cache::new(Duration::from_secs(60), 4);
        let shared = cache.clone();
        shared.set(7, 70);
        assert_eq!(cache.get(&7), Some(70));
    }
}
