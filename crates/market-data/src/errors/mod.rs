//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum for all provider and orchestrator operations
//! - [`RetryClass`]: Classification for determining retry behavior
//!
//! None of these errors is fatal to a caller of the orchestrator: they are
//! absorbed at the provider boundary and turned into a typed failure result.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the fetch pipeline reacts to it.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Connection-level failure talking to a provider.
    /// Never retried on the same provider within one request.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that could not be reached
        provider: String,
        /// The underlying transport error
        message: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429) and the retry
    /// budget after cooldown was spent.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Well-formed but empty or absent response.
    #[error("No data from {provider}: {message}")]
    NoData {
        /// The provider that had nothing for the request
        provider: String,
        /// What was missing
        message: String,
    },

    /// Response payload did not match the expected schema.
    #[error("Unexpected payload from {provider}: {message}")]
    ParseAnomaly {
        /// The provider that returned the payload
        provider: String,
        /// Decoder error
        message: String,
    },

    /// No providers are registered with the orchestrator.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// All providers were tried and all failed.
    #[error("All providers failed")]
    AllProvidersFailed,
}

impl MarketDataError {
    pub(crate) fn no_data(provider: &str, message: impl Into<String>) -> Self {
        Self::NoData {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn parse_anomaly(provider: &str, message: impl Into<String>) -> Self {
        Self::ParseAnomaly {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Map a transport error from reqwest onto the taxonomy.
    pub(crate) fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if error.is_decode() {
            Self::ParseAnomaly {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use capwatch_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::RetrySameProvider);
    ///
    /// let error = MarketDataError::AllProvidersFailed;
    /// assert_eq!(error.retry_class(), RetryClass::Exhausted);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::RetrySameProvider,

            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::NoData { .. }
            | Self::ParseAnomaly { .. } => RetryClass::NextProvider,

            Self::NoProvidersAvailable | Self::AllProvidersFailed => RetryClass::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_retries_same_provider() {
        let error = MarketDataError::RateLimited {
            provider: "GECKOTERMINAL".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::RetrySameProvider);
    }

    #[test]
    fn test_transient_network_moves_to_next_provider() {
        let error = MarketDataError::Network {
            provider: "GECKOTERMINAL".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);

        let error = MarketDataError::Timeout {
            provider: "COINGECKO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_no_data_and_parse_anomaly_are_equivalent() {
        let no_data = MarketDataError::no_data("COINGECKO", "empty chart");
        let anomaly = MarketDataError::parse_anomaly("COINGECKO", "missing field `coins`");
        assert_eq!(no_data.retry_class(), anomaly.retry_class());
        assert_eq!(no_data.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_chain_level_errors_are_exhausted() {
        assert_eq!(
            MarketDataError::NoProvidersAvailable.retry_class(),
            RetryClass::Exhausted
        );
        assert_eq!(
            MarketDataError::AllProvidersFailed.retry_class(),
            RetryClass::Exhausted
        );
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::RateLimited {
            provider: "COINGECKO".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: COINGECKO");

        let error = MarketDataError::no_data("GECKOTERMINAL", "no pools for BNKR");
        assert_eq!(
            format!("{}", error),
            "No data from GECKOTERMINAL: no pools for BNKR"
        );
    }
}
