//! Engine configuration.
//!
//! Every knob has a default that matches the public, unauthenticated tier
//! of each upstream API. Hosts override individual fields (for example from
//! environment variables) before building the orchestrator.

use std::time::Duration;

use crate::cache::DEFAULT_RESULT_TTL;
use crate::registry::{RateLimitConfig, DEFAULT_COOLDOWN, DEFAULT_MAX_RETRIES};

/// Time-to-live of provider-level response caches.
pub const DEFAULT_PROVIDER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound for a single upstream HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const GECKOTERMINAL_BASE_URL: &str = "https://api.geckoterminal.com/api/v2";
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com";

/// Settings for one upstream provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    /// API root without a trailing slash.
    pub base_url: String,
    pub rate_limit: RateLimitConfig,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    fn with_spacing(base_url: &str, min_spacing: Duration) -> Self {
        Self {
            base_url: base_url.to_string(),
            rate_limit: RateLimitConfig {
                min_spacing,
                cooldown: DEFAULT_COOLDOWN,
                max_retries: DEFAULT_MAX_RETRIES,
            },
            cache_ttl: DEFAULT_PROVIDER_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// GeckoTerminal allows roughly 30 calls per minute.
    pub fn geckoterminal() -> Self {
        Self::with_spacing(GECKOTERMINAL_BASE_URL, Duration::from_millis(2_100))
    }

    /// CoinGecko's public tier allows roughly 10 to 30 calls per minute.
    pub fn coingecko() -> Self {
        Self::with_spacing(COINGECKO_BASE_URL, Duration::from_millis(3_000))
    }

    pub fn dexscreener() -> Self {
        Self::with_spacing(DEXSCREENER_BASE_URL, Duration::from_millis(250))
    }

    /// Point this provider at another API root, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Configuration of the whole engine.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketDataConfig {
    /// Lifetime of orchestrator-level results.
    pub result_cache_ttl: Duration,
    pub geckoterminal: ProviderConfig,
    pub coingecko: ProviderConfig,
    pub dexscreener: ProviderConfig,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            result_cache_ttl: DEFAULT_RESULT_TTL,
            geckoterminal: ProviderConfig::geckoterminal(),
            coingecko: ProviderConfig::coingecko(),
            dexscreener: ProviderConfig::dexscreener(),
        }
    }
}

impl MarketDataConfig {
    fn providers_mut(&mut self) -> [&mut ProviderConfig; 3] {
        [
            &mut self.geckoterminal,
            &mut self.coingecko,
            &mut self.dexscreener,
        ]
    }

    /// Apply one throttling cooldown to every provider.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        for provider in self.providers_mut() {
            provider.rate_limit.cooldown = cooldown;
        }
        self
    }

    /// Apply one retry budget to every provider.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        for provider in self.providers_mut() {
            provider.rate_limit.max_retries = max_retries;
        }
        self
    }

    /// Apply one request timeout to every provider.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        for provider in self.providers_mut() {
            provider.request_timeout = timeout;
        }
        self
    }
}
