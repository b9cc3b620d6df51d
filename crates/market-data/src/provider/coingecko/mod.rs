//! CoinGecko market-cap provider (secondary).
//!
//! Resolves a token to a CoinGecko coin through the search endpoint, then
//! reads the market-cap history from `/coins/{id}/market_chart`. Works best
//! for established coins; fresh launches are usually not listed.
//!
//! The public tier allows roughly 10 to 30 calls per minute.
//! API documentation: https://docs.coingecko.com/reference/introduction

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use urlencoding::encode;

use crate::cache::TtlCache;
use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{DataSource, MarketCapPoint, Provenance, ProviderSeries, RangeDays, Token};
use crate::provider::http::RateLimitedClient;
use crate::provider::json::NumericRow;
use crate::provider::{MarketCapProvider, ProviderCapabilities, TokenLookup};
use crate::registry::{RateLimitConfig, RateLimitState};

use models::{MarketChartResponse, SearchCoin, SearchResponse};

const PROVIDER_ID: &str = "COINGECKO";
const DISPLAY_NAME: &str = "CoinGecko";

/// Best coin for a token among search results.
///
/// Exact symbol match first, then exact name match, then the first result
/// if its symbol shares the token symbol's first two characters. All
/// comparisons ignore case.
pub(crate) fn pick_coin<'a>(
    coins: &'a [SearchCoin],
    symbol: &str,
    name: &str,
) -> Option<&'a SearchCoin> {
    let symbol = symbol.to_lowercase();
    let name = name.to_lowercase();

    if let Some(coin) = coins.iter().find(|c| c.symbol.to_lowercase() == symbol) {
        return Some(coin);
    }

    if !name.is_empty() {
        if let Some(coin) = coins.iter().find(|c| c.name.to_lowercase() == name) {
            return Some(coin);
        }
    }

    let prefix: String = symbol.chars().take(2).collect();
    coins
        .first()
        .filter(|c| c.symbol.to_lowercase().starts_with(&prefix))
}

/// Market-cap rows to points, dropping missing, non-finite and
/// non-positive values.
pub(crate) fn chart_to_points(rows: &[NumericRow]) -> Vec<MarketCapPoint> {
    rows.iter()
        .filter_map(|row| {
            let timestamp_ms = row.get(0)?;
            let market_cap = row.get(1).filter(|v| *v > 0.0)?;
            MarketCapPoint::from_usd(timestamp_ms.round() as i64, market_cap)
        })
        .collect()
}

/// CoinGecko market-cap provider.
///
/// Looks tokens up by symbol.
pub struct CoinGeckoProvider {
    base_url: String,
    http: RateLimitedClient,
    search_cache: TtlCache<String, Arc<SearchCoin>>,
    chart_cache: TtlCache<String, Arc<MarketChartResponse>>,
}

impl CoinGeckoProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, MarketDataError> {
        Ok(Self {
            http: RateLimitedClient::new(
                PROVIDER_ID,
                DISPLAY_NAME,
                config.rate_limit,
                config.request_timeout,
            )?,
            search_cache: TtlCache::new(config.cache_ttl),
            chart_cache: TtlCache::new(config.cache_ttl),
            base_url: config.base_url,
        })
    }

    /// Resolve a token to a coin. Only matches are cached.
    async fn search(&self, symbol: &str, name: &str) -> Result<Arc<SearchCoin>, MarketDataError> {
        let key = symbol.to_lowercase();
        if let Some(hit) = self.search_cache.get(&key).await {
            debug!("{} search cache hit: {}", PROVIDER_ID, key);
            return Ok(hit);
        }

        let url = format!("{}/search?query={}", self.base_url, encode(symbol));
        let response: SearchResponse = self.http.get_json(&url).await?;

        let coin = pick_coin(&response.coins, symbol, name)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| {
                MarketDataError::no_data(PROVIDER_ID, format!("no coin matches {}", symbol))
            })?;

        self.search_cache.insert(key, Arc::clone(&coin)).await;
        Ok(coin)
    }

    async fn market_chart(
        &self,
        coin_id: &str,
        days: RangeDays,
    ) -> Result<Arc<MarketChartResponse>, MarketDataError> {
        let key = format!("{}_{}", coin_id, days);
        if let Some(hit) = self.chart_cache.get(&key).await {
            debug!("{} chart cache hit: {}", PROVIDER_ID, key);
            return Ok(hit);
        }

        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}",
            self.base_url,
            encode(coin_id),
            days
        );
        let response: MarketChartResponse = self.http.get_json(&url).await?;

        let chart = Arc::new(response);
        self.chart_cache.insert(key, Arc::clone(&chart)).await;
        Ok(chart)
    }
}

#[async_trait]
impl MarketCapProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn source(&self) -> DataSource {
        DataSource::CoinGecko
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_historical: true,
            lookup: TokenLookup::Symbol,
        }
    }

    fn rate_limit(&self) -> RateLimitConfig {
        self.http.rate_limit()
    }

    fn rate_limit_state(&self) -> Option<watch::Receiver<RateLimitState>> {
        Some(self.http.subscribe())
    }

    fn clear_cache(&self) {
        self.search_cache.clear();
        self.chart_cache.clear();
    }

    fn reset_rate_limit(&self) {
        self.http.reset();
    }

    async fn fetch_market_cap(
        &self,
        token: &Token,
        days: RangeDays,
    ) -> Result<ProviderSeries, MarketDataError> {
        let coin = self.search(&token.symbol, &token.name).await?;
        let chart = self.market_chart(&coin.id, days).await?;

        let data = chart_to_points(&chart.market_caps);
        if data.is_empty() {
            warn!("{} chart for {} has no market caps", PROVIDER_ID, coin.id);
            return Err(MarketDataError::no_data(
                PROVIDER_ID,
                format!("no market caps for {}", coin.id),
            ));
        }

        let current_price = chart
            .prices
            .last()
            .and_then(|row| row.get(1))
            .unwrap_or(0.0);

        info!(
            "{} returned {} points for {} as '{}'",
            PROVIDER_ID,
            data.len(),
            token.symbol,
            coin.id
        );

        let series = ProviderSeries::new(DataSource::CoinGecko, data);
        let current_market_cap = series.data.last().map(|p| p.y as f64).unwrap_or(0.0);

        Ok(series
            .with_current(current_market_cap, current_price)
            .with_provenance(Provenance {
                coin_id: Some(coin.id.clone()),
                ..Default::default()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, symbol: &str, name: &str) -> SearchCoin {
        SearchCoin {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    fn row(values: &[Option<f64>]) -> NumericRow {
        NumericRow(values.to_vec())
    }

    #[test]
    fn test_pick_coin_exact_symbol_wins() {
        let coins = vec![
            coin("aave-wrapped", "WAAVE", "Aave"),
            coin("aave", "aave", "Aave Token"),
        ];

        let picked = pick_coin(&coins, "AAVE", "Aave").unwrap();

        assert_eq!(picked.id, "aave");
    }

    #[test]
    fn test_pick_coin_falls_back_to_name() {
        let coins = vec![
            coin("other", "OTH", "Other"),
            coin("degen-base", "DEGEN2", "Degen"),
        ];

        let picked = pick_coin(&coins, "DEGEN", "degen").unwrap();

        assert_eq!(picked.id, "degen-base");
    }

    #[test]
    fn test_pick_coin_prefix_fallback_only_for_first_result() {
        let coins = vec![coin("toshi-base", "TOSHIB", "Toshi on Base")];
        assert_eq!(
            pick_coin(&coins, "TOSHI", "").map(|c| c.id.as_str()),
            Some("toshi-base")
        );

        let coins = vec![coin("unrelated", "XYZ", "Unrelated"), coin("to", "TOX", "")];
        assert!(pick_coin(&coins, "TOSHI", "").is_none());
        assert!(pick_coin(&[], "TOSHI", "").is_none());
    }

    #[test]
    fn test_chart_points_drop_invalid_caps() {
        let rows = vec![
            row(&[Some(1_700_000_000_000.0), Some(1_000.0)]),
            row(&[Some(1_700_000_100_000.0), Some(0.0)]),
            row(&[Some(1_700_000_200_000.0), None]),
            row(&[Some(1_700_000_300_000.0), Some(-5.0)]),
            row(&[Some(1_700_000_400_000.0), Some(2_000.4)]),
        ];

        let points = chart_to_points(&rows);

        assert_eq!(
            points,
            vec![
                MarketCapPoint::new(1_700_000_000_000, 1_000),
                MarketCapPoint::new(1_700_000_400_000, 2_000),
            ]
        );
    }
}
