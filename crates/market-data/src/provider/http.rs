//! Rate-limited JSON client shared by the HTTP providers.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::registry::{RateLimitConfig, RateLimitState, RateLimiter};

/// GET-only JSON client guarded by a per-provider [`RateLimiter`].
///
/// Every request first waits for the limiter. HTTP 429 puts the limiter
/// into its cooldown and the request is retried after it, at most
/// `max_retries` times. Any other non-2xx status is reported as `NoData`
/// and a body that does not decode is a `ParseAnomaly`.
pub(crate) struct RateLimitedClient {
    provider: &'static str,
    client: Client,
    limiter: RateLimiter,
}

impl RateLimitedClient {
    /// `provider` is the provider id used in errors; `display_name` is what
    /// the throttling state reports as its source.
    pub fn new(
        provider: &'static str,
        display_name: &'static str,
        rate_limit: RateLimitConfig,
        request_timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MarketDataError::Network {
                provider: provider.to_string(),
                message: format!("Failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            provider,
            client,
            limiter: RateLimiter::new(display_name, rate_limit),
        })
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        self.limiter.config().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RateLimitState> {
        self.limiter.subscribe()
    }

    pub fn reset(&self) {
        self.limiter.clear();
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MarketDataError> {
        let max_retries = self.limiter.config().max_retries;
        let mut retries = 0;

        loop {
            self.limiter.acquire().await;
            debug!("{} request: {}", self.provider, url);

            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| MarketDataError::from_transport(self.provider, e))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries >= max_retries {
                    warn!(
                        "{} still rate limited after {} retries, giving up",
                        self.provider, retries
                    );
                    return Err(MarketDataError::RateLimited {
                        provider: self.provider.to_string(),
                    });
                }
                retries += 1;
                let cooldown = self.limiter.config().cooldown;
                warn!(
                    "{} rate limited, waiting {}s before retry {}/{}",
                    self.provider,
                    cooldown.as_secs(),
                    retries,
                    max_retries
                );
                self.limiter.report_throttled(cooldown);
                continue;
            }

            if !status.is_success() {
                return Err(MarketDataError::no_data(
                    self.provider,
                    format!("HTTP {}", status),
                ));
            }

            let body = response
                .text()
                .await
                .map_err(|e| MarketDataError::from_transport(self.provider, e))?;

            return serde_json::from_str(&body)
                .map_err(|e| MarketDataError::parse_anomaly(self.provider, e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_starts_idle() {
        let config = RateLimitConfig {
            min_spacing: Duration::from_millis(250),
            ..Default::default()
        };
        let client =
            RateLimitedClient::new("TEST", "Test", config.clone(), Duration::from_secs(5)).unwrap();

        assert_eq!(client.rate_limit(), config);
        assert!(!client.subscribe().borrow().is_waiting);
    }
}
