//! DexScreener market-cap provider (tertiary).
//!
//! DexScreener only reports the current valuation of a pair, so this
//! provider answers with a single point at the request time. It is the
//! last resort for tokens the other providers cannot chart.
//!
//! API documentation: https://docs.dexscreener.com/api/reference

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};
use urlencoding::encode;

use crate::cache::TtlCache;
use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{
    DataSource, MarketCapPoint, Platform, Provenance, ProviderSeries, RangeDays, Token,
};
use crate::provider::http::RateLimitedClient;
use crate::provider::{MarketCapProvider, ProviderCapabilities, TokenLookup};
use crate::registry::{RateLimitConfig, RateLimitState};

use models::{Pair, TokenPairsResponse};

const PROVIDER_ID: &str = "DEXSCREENER";
const DISPLAY_NAME: &str = "DexScreener";

/// DexScreener chain id for a platform.
pub fn chain_for(platform: &Platform) -> &str {
    match platform {
        Platform::Ethereum => "ethereum",
        Platform::Base => "base",
        Platform::Solana => "solana",
        Platform::Other(raw) => raw.as_str(),
    }
}

/// Most liquid pair on `chain`; the first one wins ties.
pub(crate) fn select_best_pair<'a>(pairs: &'a [Pair], chain: &str) -> Option<&'a Pair> {
    let liquidity = |pair: &Pair| pair.liquidity_usd().unwrap_or(0.0);

    pairs
        .iter()
        .filter(|pair| pair.chain_id.eq_ignore_ascii_case(chain))
        .fold(None, |best, pair| match best {
            Some(current) if liquidity(pair) <= liquidity(current) => Some(current),
            _ => Some(pair),
        })
}

/// DexScreener market-cap provider.
///
/// Looks tokens up by contract address; pairs on other chains are ignored.
pub struct DexScreenerProvider {
    base_url: String,
    http: RateLimitedClient,
    pairs_cache: TtlCache<String, Arc<Vec<Pair>>>,
}

impl DexScreenerProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, MarketDataError> {
        Ok(Self {
            http: RateLimitedClient::new(
                PROVIDER_ID,
                DISPLAY_NAME,
                config.rate_limit,
                config.request_timeout,
            )?,
            pairs_cache: TtlCache::new(config.cache_ttl),
            base_url: config.base_url,
        })
    }

    async fn token_pairs(&self, address: &str) -> Result<Arc<Vec<Pair>>, MarketDataError> {
        if let Some(hit) = self.pairs_cache.get(&address.to_string()).await {
            debug!("{} pairs cache hit: {}", PROVIDER_ID, address);
            return Ok(hit);
        }

        let url = format!("{}/latest/dex/tokens/{}", self.base_url, encode(address));
        let response: TokenPairsResponse = self.http.get_json(&url).await?;

        let pairs = Arc::new(response.pairs.unwrap_or_default());
        self.pairs_cache
            .insert(address.to_string(), Arc::clone(&pairs))
            .await;
        Ok(pairs)
    }
}

#[async_trait]
impl MarketCapProvider for DexScreenerProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn source(&self) -> DataSource {
        DataSource::DexScreener
    }

    fn priority(&self) -> u8 {
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_historical: false,
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
        self.pairs_cache.clear();
    }

    fn reset_rate_limit(&self) {
        self.http.reset();
    }

    async fn fetch_market_cap(
        &self,
        token: &Token,
        _days: RangeDays,
    ) -> Result<ProviderSeries, MarketDataError> {
        let chain = chain_for(&token.platform);
        let pairs = self.token_pairs(token.contract.trim()).await?;

        let pair = select_best_pair(&pairs, chain).ok_or_else(|| {
            MarketDataError::no_data(
                PROVIDER_ID,
                format!("no {} pairs for {}", chain, token.symbol),
            )
        })?;

        let market_cap = pair
            .market_cap
            .filter(|v| *v > 0.0)
            .or(pair.fdv.filter(|v| *v > 0.0))
            .ok_or_else(|| {
                MarketDataError::no_data(
                    PROVIDER_ID,
                    format!("no valuation for {}", token.symbol),
                )
            })?;

        let point = MarketCapPoint::from_usd(Utc::now().timestamp_millis(), market_cap)
            .ok_or_else(|| MarketDataError::parse_anomaly(PROVIDER_ID, "invalid market cap"))?;

        info!(
            "{} returned current market cap for {}: ${:.0}",
            PROVIDER_ID, token.symbol, market_cap
        );

        Ok(ProviderSeries::new(DataSource::DexScreener, vec![point])
            .with_current(market_cap, pair.price_usd.unwrap_or(0.0))
            .with_provenance(Provenance {
                pair_address: pair.pair_address.clone(),
                liquidity_usd: pair.liquidity_usd(),
                ..Default::default()
            }))
    }
}
