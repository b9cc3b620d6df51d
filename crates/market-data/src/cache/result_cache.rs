//! Orchestrator-level cache of final per-token results

use std::sync::Arc;
use std::time::Duration;

use super::TtlCache;
use crate::models::{FetchResult, RangeDays};

/// Default lifetime of a cached result.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache of fetch results keyed by `(token id, range days)`.
///
/// Values are shared behind an `Arc` so repeated hits hand back the very
/// same result, independent of which provider produced it.
#[derive(Clone)]
pub struct ResultCache {
    entries: TtlCache<(String, RangeDays), Arc<FetchResult>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: TtlCache::new(ttl),
        }
    }

    pub async fn get(&self, token_id: &str, days: RangeDays) -> Option<Arc<FetchResult>> {
        self.entries.get(&(token_id.to_string(), days)).await
    }

    pub async fn set(&self, token_id: &str, days: RangeDays, result: Arc<FetchResult>) {
        self.entries.insert((token_id.to_string(), days), result).await;
    }

    /// Drop every cached result (manual refresh)
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataSource, MarketCapPoint, ProviderSeries, Token};

    fn create_test_result(id: &str) -> Arc<FetchResult> {
        let token = Token::new(id, id.to_uppercase(), "base", "0x1");
        let series = ProviderSeries::new(DataSource::GeckoTerminal, vec![MarketCapPoint::new(1, 1)]);
        Arc::new(FetchResult::from_series(token, series))
    }

    #[tokio::test]
    async fn test_hit_returns_same_allocation() {
        let cache = ResultCache::default();
        let result = create_test_result("bnkr");

        cache.set("bnkr", 30, result.clone()).await;

        let cached = cache.get("bnkr", 30).await.unwrap();
        assert!(Arc::ptr_eq(&cached, &result));
    }

    #[tokio::test]
    async fn test_range_is_part_of_the_key() {
        let cache = ResultCache::default();
        cache.set("bnkr", 30, create_test_result("bnkr")).await;

        assert!(cache.get("bnkr", 7).await.is_none());
        assert!(cache.get("clawd", 30).await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResultCache::default();
        cache.set("bnkr", 30, create_test_result("bnkr")).await;

        cache.clear();

        assert!(cache.get("bnkr", 30).await.is_none());
    }
}
