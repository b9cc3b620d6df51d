//! Generic in-memory cache with a fixed TTL using moka

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

/// Default bound on live entries per cache.
const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// Time-bounded memoization.
///
/// Entries expire `ttl` after insertion and are never updated in place;
/// a read returns either a live value or nothing.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Get a live entry
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    /// Store an entry, replacing any previous one for the key
    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Evict everything immediately
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(300));

        cache.insert("pools_base_0xabc".to_string(), 7).await;

        assert_eq!(cache.get(&"pools_base_0xabc".to_string()).await, Some(7));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(300));

        assert!(cache.get(&"missing".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear_evicts_immediately() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(300));
        cache.insert("a".to_string(), 1).await;
        cache.insert("b".to_string(), 2).await;

        cache.clear();

        assert!(cache.get(&"a".to_string()).await.is_none());
        assert!(cache.get(&"b".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(50));
        cache.insert("a".to_string(), 1).await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(&"a".to_string()).await.is_none());
    }
}
