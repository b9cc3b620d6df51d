//! GeckoTerminal market-cap provider (primary).
//!
//! GeckoTerminal has no market-cap history endpoint, so the series is
//! reconstructed from the OHLCV candles of the token's deepest pool:
//! circulating supply is estimated once as `fdv / price` and every close is
//! scaled by it.
//!
//! Free tier is limited to about 30 calls per minute.
//! API documentation: https://www.geckoterminal.com/dex-api

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use urlencoding::encode;

use crate::cache::TtlCache;
use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{
    DataSource, MarketCapPoint, Platform, Provenance, ProviderSeries, RangeDays, Token,
};
use crate::provider::http::RateLimitedClient;
use crate::provider::json::NumericRow;
use crate::provider::{MarketCapProvider, ProviderCapabilities, TokenLookup};
use crate::registry::{RateLimitConfig, RateLimitState};

use models::{OhlcvResponse, PoolAttributes, PoolsResponse, TokenAttributes, TokenInfoResponse};

const PROVIDER_ID: &str = "GECKOTERMINAL";
const DISPLAY_NAME: &str = "GeckoTerminal";

/// Supply assumed when it cannot be derived from fdv and price.
///
/// Series built on it are only proportional to the real market cap.
pub const FALLBACK_SUPPLY_ESTIMATE: f64 = 1e9;

// ============================================================================
// Candle selection
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeframe {
    Minute,
    Hour,
    Day,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

/// Candle granularity and count requested for a range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandleSpec {
    pub timeframe: Timeframe,
    pub aggregate: u32,
    pub limit: u32,
}

impl CandleSpec {
    /// Pick the granularity for the last `days` days.
    ///
    /// The API returns at most a few hundred candles per call, so longer
    /// ranges trade resolution for coverage.
    pub fn for_days(days: RangeDays) -> Self {
        let (timeframe, aggregate, limit) = match days {
            0..=1 => (Timeframe::Minute, 15, 96),
            2..=7 => (Timeframe::Hour, 1, (days * 24).min(168)),
            8..=30 => (Timeframe::Hour, 4, (days * 6).min(180)),
            _ => (Timeframe::Day, 1, days.min(180)),
        };

        Self {
            timeframe,
            aggregate,
            limit,
        }
    }
}

// ============================================================================
// Series reconstruction
// ============================================================================

/// GeckoTerminal network slug for a platform.
pub fn network_for(platform: &Platform) -> &str {
    match platform {
        Platform::Ethereum => "eth",
        Platform::Base => "base",
        Platform::Solana => "solana",
        Platform::Other(raw) => raw.as_str(),
    }
}

/// Pool with the highest USD reserve; the first one wins ties.
pub(crate) fn select_best_pool(pools: &[PoolAttributes]) -> Option<&PoolAttributes> {
    let reserve = |pool: &PoolAttributes| pool.reserve_in_usd.unwrap_or(0.0);

    pools.iter().fold(None, |best, pool| match best {
        Some(current) if reserve(pool) <= reserve(current) => Some(current),
        _ => Some(pool),
    })
}

/// Circulating supply implied by fdv and price, or 0 when unknown.
pub(crate) fn estimate_supply(fdv: f64, price: f64) -> f64 {
    if fdv > 0.0 && price > 0.0 {
        fdv / price
    } else {
        0.0
    }
}

/// Map candles to market-cap points.
///
/// Rows without a timestamp or close, and closes that are negative, are
/// dropped. A zero `supply` falls back to [`FALLBACK_SUPPLY_ESTIMATE`].
pub(crate) fn candles_to_points(rows: &[NumericRow], supply: f64) -> Vec<MarketCapPoint> {
    let supply = if supply > 0.0 {
        supply
    } else {
        FALLBACK_SUPPLY_ESTIMATE
    };

    rows.iter()
        .filter_map(|row| {
            let timestamp_secs = row.get(0)?;
            let close = row.get(4)?;
            MarketCapPoint::from_usd((timestamp_secs * 1000.0).round() as i64, close * supply)
        })
        .collect()
}

/// Single point at the request time from the token's current valuation.
fn current_valuation_series(
    attributes: Option<&TokenAttributes>,
    price: f64,
    provenance: Provenance,
) -> Result<ProviderSeries, MarketDataError> {
    let market_cap = attributes
        .and_then(|a| {
            a.market_cap_usd
                .filter(|v| *v > 0.0)
                .or(a.fdv_usd.filter(|v| *v > 0.0))
        })
        .ok_or_else(|| {
            MarketDataError::no_data(PROVIDER_ID, "no candles and no current valuation")
        })?;

    let point = MarketCapPoint::from_usd(Utc::now().timestamp_millis(), market_cap)
        .ok_or_else(|| MarketDataError::parse_anomaly(PROVIDER_ID, "invalid market cap"))?;

    Ok(ProviderSeries::new(DataSource::Fallback, vec![point])
        .with_current(market_cap, price)
        .with_provenance(provenance))
}

// ============================================================================
// GeckoTerminalProvider
// ============================================================================

/// GeckoTerminal market-cap provider.
///
/// Looks tokens up by chain and contract address.
pub struct GeckoTerminalProvider {
    base_url: String,
    http: RateLimitedClient,
    token_info_cache: TtlCache<String, Arc<TokenAttributes>>,
    pools_cache: TtlCache<String, Arc<Vec<PoolAttributes>>>,
    ohlcv_cache: TtlCache<String, Arc<Vec<NumericRow>>>,
}

impl GeckoTerminalProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, MarketDataError> {
        Ok(Self {
            http: RateLimitedClient::new(
                PROVIDER_ID,
                DISPLAY_NAME,
                config.rate_limit,
                config.request_timeout,
            )?,
            token_info_cache: TtlCache::new(config.cache_ttl),
            pools_cache: TtlCache::new(config.cache_ttl),
            ohlcv_cache: TtlCache::new(config.cache_ttl),
            base_url: config.base_url,
        })
    }

    async fn token_info(
        &self,
        network: &str,
        address: &str,
    ) -> Result<Arc<TokenAttributes>, MarketDataError> {
        let key = format!("{}_{}", network, address);
        if let Some(hit) = self.token_info_cache.get(&key).await {
            debug!("{} token info cache hit: {}", PROVIDER_ID, key);
            return Ok(hit);
        }

        let url = format!(
            "{}/networks/{}/tokens/{}",
            self.base_url,
            encode(network),
            encode(address)
        );
        let response: TokenInfoResponse = self.http.get_json(&url).await?;

        let attributes = Arc::new(response.data.attributes);
        self.token_info_cache
            .insert(key, Arc::clone(&attributes))
            .await;
        Ok(attributes)
    }

    async fn pools(
        &self,
        network: &str,
        address: &str,
    ) -> Result<Arc<Vec<PoolAttributes>>, MarketDataError> {
        let key = format!("{}_{}", network, address);
        if let Some(hit) = self.pools_cache.get(&key).await {
            debug!("{} pools cache hit: {}", PROVIDER_ID, key);
            return Ok(hit);
        }

        let url = format!(
            "{}/networks/{}/tokens/{}/pools?page=1",
            self.base_url,
            encode(network),
            encode(address)
        );
        let response: PoolsResponse = self.http.get_json(&url).await?;

        let pools = Arc::new(
            response
                .data
                .into_iter()
                .map(|pool| pool.attributes)
                .collect::<Vec<_>>(),
        );
        self.pools_cache.insert(key, Arc::clone(&pools)).await;
        Ok(pools)
    }

    async fn ohlcv(
        &self,
        network: &str,
        pool: &str,
        spec: CandleSpec,
    ) -> Result<Arc<Vec<NumericRow>>, MarketDataError> {
        let key = format!(
            "{}_{}_{}_{}_{}",
            network,
            pool,
            spec.timeframe.as_str(),
            spec.aggregate,
            spec.limit
        );
        if let Some(hit) = self.ohlcv_cache.get(&key).await {
            debug!("{} OHLCV cache hit: {}", PROVIDER_ID, key);
            return Ok(hit);
        }

        let url = format!(
            "{}/networks/{}/pools/{}/ohlcv/{}?aggregate={}&limit={}&currency=usd",
            self.base_url,
            encode(network),
            encode(pool),
            spec.timeframe.as_str(),
            spec.aggregate,
            spec.limit
        );
        let response: OhlcvResponse = self.http.get_json(&url).await?;

        let rows = Arc::new(response.data.attributes.ohlcv_list);
        self.ohlcv_cache.insert(key, Arc::clone(&rows)).await;
        Ok(rows)
    }
}

#[async_trait]
impl MarketCapProvider for GeckoTerminalProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn source(&self) -> DataSource {
        DataSource::GeckoTerminal
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_historical: true,
            lookup: TokenLookup::Contract,
        }
    }

    fn rate_limit(&self) -> RateLimitConfig {
        self.http.rate_limit()
    }

    fn rate_limit_state(&self) -> Option<watch::Receiver<RateLimitState>> {
        Some(self.http.subscribe())
    }

    fn clear_cache(&self) {
        self.token_info_cache.clear();
        self.pools_cache.clear();
        self.ohlcv_cache.clear();
    }

    fn reset_rate_limit(&self) {
        self.http.reset();
    }

    async fn fetch_market_cap(
        &self,
        token: &Token,
        days: RangeDays,
    ) -> Result<ProviderSeries, MarketDataError> {
        let network = network_for(&token.platform);
        let contract = token.contract.trim();

        // Valuation attributes are optional; pools and candles are not.
        let attributes = match self.token_info(network, contract).await {
            Ok(attributes) => Some(attributes),
            Err(e) => {
                debug!("{} token info unavailable for {}: {}", PROVIDER_ID, token.symbol, e);
                None
            }
        };

        let pools = self.pools(network, contract).await?;
        let best = select_best_pool(&pools).ok_or_else(|| {
            MarketDataError::no_data(PROVIDER_ID, format!("no pools for {}", token.symbol))
        })?;
        let pool_address = best
            .address
            .clone()
            .ok_or_else(|| MarketDataError::parse_anomaly(PROVIDER_ID, "pool without address"))?;

        let fdv = attributes.as_ref().and_then(|a| a.fdv_usd).unwrap_or(0.0);
        let price = attributes
            .as_ref()
            .and_then(|a| a.price_usd)
            .filter(|p| *p > 0.0)
            .or(best.base_token_price_usd)
            .unwrap_or(0.0);
        let supply = estimate_supply(fdv, price);

        let provenance = Provenance {
            pool_address: Some(pool_address.clone()),
            liquidity_usd: best.reserve_in_usd,
            ..Default::default()
        };

        let spec = CandleSpec::for_days(days);
        let rows = match self.ohlcv(network, &pool_address, spec).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    "{} OHLCV failed for {} ({}), using current valuation",
                    PROVIDER_ID, token.symbol, e
                );
                return current_valuation_series(attributes.as_deref(), price, provenance);
            }
        };

        let data = candles_to_points(&rows, supply);
        if data.is_empty() {
            return Err(MarketDataError::no_data(
                PROVIDER_ID,
                format!("no usable candles for {}", token.symbol),
            ));
        }

        if supply == 0.0 {
            warn!(
                "{} supply unknown for {}, scaling closes by {}",
                PROVIDER_ID, token.symbol, FALLBACK_SUPPLY_ESTIMATE
            );
        }

        let current_market_cap = if fdv > 0.0 { fdv } else { price * supply };

        info!(
            "{} returned {} points for {} from pool {}",
            PROVIDER_ID,
            data.len(),
            token.symbol,
            pool_address
        );

        Ok(ProviderSeries::new(DataSource::GeckoTerminal, data)
            .with_current(current_market_cap, price)
            .with_provenance(provenance))
    }
}
