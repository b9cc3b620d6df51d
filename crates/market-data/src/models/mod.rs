//! Market data models
//!
//! This module contains the core data types for market-cap aggregation:
//! - `types` - Type aliases for common identifiers (ProviderId, RangeDays)
//! - `token` - Tracked token identity (Token) and chain (Platform)
//! - `market_cap` - Series points, provider output and per-token results
//! - `merged` - Variant-merged display entries (MergedToken)
//! - `progress` - Batch fetch progress and stream events

mod market_cap;
mod merged;
mod progress;
mod token;
mod types;

pub use market_cap::{
    normalize_series, DataSource, FetchResult, MarketCapPoint, Provenance, ProviderSeries,
};
pub use merged::{MergedToken, VariantEntry, VariantInfo};
pub use progress::{FetchEvent, FetchProgress};
pub use token::{Platform, Token};
pub use types::{ProviderId, RangeDays};
