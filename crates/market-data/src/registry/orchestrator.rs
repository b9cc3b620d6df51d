//! Ordered fallback chain over market-cap providers.
//!
//! The orchestrator asks providers strictly in priority order and keeps the
//! first non-empty series. Provider failures never escape: they are logged,
//! recorded in [`FetchDiagnostics`] and, when every provider is exhausted,
//! turned into a failed [`FetchResult`].

use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::diagnostics::{FetchDiagnostics, SkipReason};
use super::rate_limit_state::{RateLimitState, RateLimitSubscription};
use crate::cache::ResultCache;
use crate::config::MarketDataConfig;
use crate::errors::MarketDataError;
use crate::models::{
    FetchEvent, FetchProgress, FetchResult, ProviderId, ProviderSeries, RangeDays, Token,
};
use crate::provider::{
    CoinGeckoProvider, DexScreenerProvider, GeckoTerminalProvider, MarketCapProvider,
    TokenLookup,
};

/// Longest range, in days, requested from upstream APIs.
pub const MAX_RANGE_DAYS: RangeDays = 180;

/// Events buffered between a streamed fetch and its consumer.
const STREAM_BUFFER: usize = 16;

/// Translate a user-facing range into the `days` sent upstream.
///
/// `None` stands for "max" and maps to [`MAX_RANGE_DAYS`]; longer ranges
/// are capped to it.
pub fn days_to_api_param(range: Option<RangeDays>) -> RangeDays {
    range.map_or(MAX_RANGE_DAYS, |days| days.min(MAX_RANGE_DAYS))
}

/// Fallback-chain orchestrator with an orchestrator-level result cache.
pub struct FetchOrchestrator {
    /// Sorted by priority; equal priorities keep registration order.
    providers: Vec<Arc<dyn MarketCapProvider>>,
    cache: ResultCache,
}

impl FetchOrchestrator {
    /// Create an orchestrator over `providers`.
    ///
    /// Providers are ordered by their declared priority.
    pub fn new(mut providers: Vec<Arc<dyn MarketCapProvider>>, config: &MarketDataConfig) -> Self {
        providers.sort_by_key(|p| p.priority());

        Self {
            providers,
            cache: ResultCache::new(config.result_cache_ttl),
        }
    }

    /// GeckoTerminal, then CoinGecko, then DexScreener, each built from
    /// its section of `config`.
    ///
    /// Fails only when an HTTP client cannot be initialized.
    pub fn with_default_providers(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let providers: Vec<Arc<dyn MarketCapProvider>> = vec![
            Arc::new(GeckoTerminalProvider::new(config.geckoterminal.clone())?),
            Arc::new(CoinGeckoProvider::new(config.coingecko.clone())?),
            Arc::new(DexScreenerProvider::new(config.dexscreener.clone())?),
        ];
        Ok(Self::new(providers, config))
    }

    /// Get the list of registered providers in fallback order.
    pub fn providers(&self) -> &[Arc<dyn MarketCapProvider>] {
        &self.providers
    }

    /// Fetch one token, serving repeated requests from the cache.
    ///
    /// Never fails: when no provider has data the result has `error == true`,
    /// an empty series and `source == none`.
    pub async fn fetch_one(&self, token: &Token, days: RangeDays) -> Arc<FetchResult> {
        self.fetch_one_with_diagnostics(token, days).await.0
    }

    /// Like [`fetch_one`](Self::fetch_one), also returning the trace of
    /// provider attempts.
    pub async fn fetch_one_with_diagnostics(
        &self,
        token: &Token,
        days: RangeDays,
    ) -> (Arc<FetchResult>, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();

        if let Some(cached) = self.cache.get(&token.id, days).await {
            debug!("Result cache hit for '{}' ({}d)", token.id, days);
            diagnostics.cache_hit = true;
            return (cached, diagnostics);
        }

        match self.run_chain(token, days, &mut diagnostics).await {
            Ok(series) => {
                let result = Arc::new(FetchResult::from_series(token.clone(), series));
                info!(
                    "{}: {} points from {}",
                    token.symbol,
                    result.data.len(),
                    result.source
                );
                self.cache.set(&token.id, days, Arc::clone(&result)).await;
                (result, diagnostics)
            }
            Err(e) => {
                warn!(
                    "No market cap data for {} ({}): {}",
                    token.symbol,
                    e,
                    diagnostics.summary()
                );
                (Arc::new(FetchResult::failed(token.clone())), diagnostics)
            }
        }
    }

    async fn run_chain(
        &self,
        token: &Token,
        days: RangeDays,
        diagnostics: &mut FetchDiagnostics,
    ) -> Result<ProviderSeries, MarketDataError> {
        if self.providers.is_empty() {
            return Err(MarketDataError::NoProvidersAvailable);
        }

        let has_contract = !token.contract.trim().is_empty();

        for provider in &self.providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());
            let capabilities = provider.capabilities();

            if capabilities.lookup == TokenLookup::Contract && !has_contract {
                debug!(
                    "Provider '{}' needs a contract address, skipping {}",
                    provider_id, token.symbol
                );
                diagnostics.record_skip(provider_id, SkipReason::MissingContract);
                continue;
            }

            debug!("Trying provider '{}' for {}", provider_id, token.symbol);

            match provider.fetch_market_cap(token, days).await {
                Ok(series) if !series.data.is_empty() => {
                    if !capabilities.supports_historical {
                        info!(
                            "Provider '{}' has only current data for {}",
                            provider_id, token.symbol
                        );
                    }
                    diagnostics.record_success(provider_id, series.data.len());
                    return Ok(series);
                }
                Ok(_) => {
                    warn!(
                        "Provider '{}' returned no data for {}, trying next",
                        provider_id, token.symbol
                    );
                    diagnostics.record_empty(provider_id);
                }
                Err(e) => {
                    warn!(
                        "Provider '{}' failed for {} ({:?}): {}, trying next",
                        provider_id,
                        token.symbol,
                        e.retry_class(),
                        e
                    );
                    diagnostics.record_error(provider_id, e.to_string());
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed)
    }

    /// Fetch tokens one after another.
    ///
    /// `on_progress` is called before each token starts. Results come back
    /// in input order.
    pub async fn fetch_many(
        &self,
        tokens: &[Token],
        days: RangeDays,
        mut on_progress: impl FnMut(FetchProgress),
    ) -> Vec<Arc<FetchResult>> {
        let total = tokens.len();
        let mut results = Vec::with_capacity(total);

        for (index, token) in tokens.iter().enumerate() {
            on_progress(FetchProgress {
                current: index + 1,
                total,
                token: token.symbol.clone(),
            });
            results.push(self.fetch_one(token, days).await);
        }

        results
    }

    /// Fetch tokens one after another on a background task, yielding a
    /// `Progress` event before and a `Completed` event after each token.
    ///
    /// The loop stops before the next token once `cancel` fires or the
    /// stream is dropped; a token already in flight finishes first.
    /// Must be called from within a tokio runtime.
    pub fn fetch_many_stream(
        self: &Arc<Self>,
        tokens: Vec<Token>,
        days: RangeDays,
        cancel: CancellationToken,
    ) -> ReceiverStream<FetchEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let orchestrator = Arc::clone(self);

        tokio::spawn(async move {
            let total = tokens.len();

            for (index, token) in tokens.iter().enumerate() {
                if cancel.is_cancelled() || tx.is_closed() {
                    debug!("Streamed fetch stopped after {} of {} tokens", index, total);
                    return;
                }

                let progress = FetchProgress {
                    current: index + 1,
                    total,
                    token: token.symbol.clone(),
                };
                if tx.send(FetchEvent::Progress(progress)).await.is_err() {
                    return;
                }

                let result = orchestrator.fetch_one(token, days).await;
                if tx.send(FetchEvent::Completed(result)).await.is_err() {
                    return;
                }
            }
        });

        ReceiverStream::new(rx)
    }

    /// Evict the result cache and every provider cache.
    pub fn clear_all_caches(&self) {
        self.cache.clear();
        for provider in &self.providers {
            provider.clear_cache();
        }
        info!("Cleared all market data caches");
    }

    /// Abort every running throttling cooldown.
    pub fn clear_rate_limit_wait(&self) {
        for provider in &self.providers {
            provider.reset_rate_limit();
        }
    }

    /// Forward every provider's throttling state changes to `callback`.
    ///
    /// Forwarding stops when the returned subscription is dropped or
    /// unsubscribed. Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> RateLimitSubscription
    where
        F: Fn(RateLimitState) + Send + Sync + 'static,
    {
        let receivers = self
            .providers
            .iter()
            .filter_map(|p| p.rate_limit_state())
            .collect();

        RateLimitSubscription::spawn(receivers, Arc::new(callback))
    }
}
