//! Capwatch Market Data Crate
//!
//! This crate aggregates historical market-capitalization series for a set
//! of tokens from several unreliable, rate-limited upstream APIs and
//! presents one normalized result per token.
//!
//! # Overview
//!
//! - Three providers behind one trait, tried in a fixed fallback order:
//!   GeckoTerminal (OHLCV-derived history), CoinGecko (market chart) and
//!   DexScreener (current value only)
//! - Per-provider minimum request spacing, with a cooldown-and-retry policy
//!   on HTTP 429 whose countdown can be observed
//! - TTL caches at the provider level and for final results
//! - Merging of the same symbol tracked on several chains
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! | FetchOrchestrator|  (result cache, fallback chain, progress)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | MarketCapProvider| --> |   RateLimiter    |  (spacing, 429 cooldown)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |   FetchResult    |  (normalized series)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  merge_variants  |  (one visible entry per symbol)
//! +------------------+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use capwatch_market_data::{
//!     days_to_api_param, display_tokens, merge_variants, FetchOrchestrator, MarketDataConfig,
//!     Token,
//! };
//!
//! # async fn run() -> Result<(), capwatch_market_data::MarketDataError> {
//! let orchestrator = FetchOrchestrator::with_default_providers(&MarketDataConfig::default())?;
//! let tokens = vec![Token::new(
//!     "degen-base",
//!     "DEGEN",
//!     "base",
//!     "0x4ed4e862860bed51a9570b96d89af5e1b0efefed",
//! )];
//!
//! let results = orchestrator
//!     .fetch_many(&tokens, days_to_api_param(Some(30)), |p| {
//!         println!("{}/{} {}", p.current, p.total, p.token)
//!     })
//!     .await;
//! let merged = merge_variants(results);
//! for entry in display_tokens(&merged) {
//!     println!("{}: {} points", entry.entry.token.symbol, entry.entry.data.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod merger;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    normalize_series, DataSource, FetchEvent, FetchProgress, FetchResult, MarketCapPoint,
    MergedToken, Platform, Provenance, ProviderId, ProviderSeries, RangeDays, Token,
    VariantEntry, VariantInfo,
};

pub use config::{MarketDataConfig, ProviderConfig};
pub use errors::{MarketDataError, RetryClass};
pub use merger::{display_tokens, has_variants, merge_variants, platform_label};

// Re-export provider types
pub use provider::{
    CoinGeckoProvider, DexScreenerProvider, GeckoTerminalProvider, MarketCapProvider,
    ProviderCapabilities, TokenLookup,
};

// Re-export registry types
pub use registry::{
    days_to_api_param, FetchDiagnostics, FetchOrchestrator, RateLimitConfig, RateLimitState,
    RateLimitSubscription, RateLimiter,
};

// Re-export stream plumbing used by `fetch_many_stream`
pub use tokio_util::sync::CancellationToken;
