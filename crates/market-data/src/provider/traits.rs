//! Market-cap provider trait definitions.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::errors::MarketDataError;
use crate::models::{DataSource, ProviderSeries, RangeDays, Token};
use crate::registry::{RateLimitConfig, RateLimitState};

use super::capabilities::ProviderCapabilities;

/// Trait for market-cap providers.
///
/// Implement this trait to add a new upstream source. The orchestrator
/// orders providers by [`priority`](Self::priority) and asks each one in
/// turn until one returns a non-empty series.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use capwatch_market_data::provider::{MarketCapProvider, ProviderCapabilities, TokenLookup};
///
/// struct StaticProvider;
///
/// #[async_trait]
/// impl MarketCapProvider for StaticProvider {
///     fn id(&self) -> &'static str {
///         "STATIC"
///     }
///
///     fn source(&self) -> DataSource {
///         DataSource::Fallback
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             supports_historical: false,
///             lookup: TokenLookup::Symbol,
///         }
///     }
///
///     // ... implement fetch_market_cap
/// }
/// ```
#[async_trait]
pub trait MarketCapProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// A constant string like "GECKOTERMINAL" or "COINGECKO", used for
    /// logging and diagnostics.
    fn id(&self) -> &'static str;

    /// Source tag attached to results from this provider.
    fn source(&self) -> DataSource;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Describes what this provider can do.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Rate limiting configuration.
    fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::default()
    }

    /// Observe this provider's throttling state.
    ///
    /// Providers without a rate limiter return `None`.
    fn rate_limit_state(&self) -> Option<watch::Receiver<RateLimitState>> {
        None
    }

    /// Drop any cached upstream responses.
    fn clear_cache(&self) {}

    /// Abort a running throttling cooldown and return to idle.
    fn reset_rate_limit(&self) {}

    /// Fetch a market-cap series for a token over the last `days` days.
    ///
    /// Points in the returned series are sorted by timestamp with no
    /// duplicates. An empty series and `NoData` both mean "try the next
    /// provider".
    async fn fetch_market_cap(
        &self,
        token: &Token,
        days: RangeDays,
    ) -> Result<ProviderSeries, MarketDataError>;
}
