use std::time::Duration;

use capwatch_market_data::MarketDataConfig;

pub struct Config {
    pub market: MarketDataConfig,
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Defaults with overrides from the environment (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut market = MarketDataConfig::default();

        if let Some(secs) = env_u64("CAPWATCH_RESULT_CACHE_TTL_SECS") {
            market.result_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("CAPWATCH_COOLDOWN_SECS") {
            market = market.with_cooldown(Duration::from_secs(secs));
        }
        if let Some(retries) = env_u64("CAPWATCH_MAX_RETRIES") {
            market = market.with_max_retries(u32::try_from(retries).unwrap_or(u32::MAX));
        }
        if let Some(ms) = env_u64("CAPWATCH_REQUEST_TIMEOUT_MS") {
            market = market.with_request_timeout(Duration::from_millis(ms));
        }
        if let Some(url) = env_string("CAPWATCH_GECKOTERMINAL_URL") {
            market.geckoterminal = market.geckoterminal.with_base_url(url);
        }
        if let Some(url) = env_string("CAPWATCH_COINGECKO_URL") {
            market.coingecko = market.coingecko.with_base_url(url);
        }
        if let Some(url) = env_string("CAPWATCH_DEXSCREENER_URL") {
            market.dexscreener = market.dexscreener.with_base_url(url);
        }

        Self { market }
    }
}
