//! Minimum-spacing rate limiter with a throttling cooldown.
//!
//! One limiter instance belongs to one provider. It enforces a fixed gap
//! between granted requests and, once the upstream answers with HTTP 429,
//! blocks every caller for a cooldown while counting down once per second
//! on an observable [`RateLimitState`].
//!
//! All timing goes through `tokio::time`, so the behavior can be tested
//! with a paused clock.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::rate_limit_state::RateLimitState;
use crate::models::ProviderId;

/// Cooldown applied after a throttling response.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Retries allowed after throttling, per logical request.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Countdown granularity.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Rate limiter configuration for a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Minimum gap between two granted requests.
    pub min_spacing: Duration,
    /// How long to back off after a throttling response.
    pub cooldown: Duration,
    /// Retries allowed after throttling before the request fails.
    pub max_retries: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_spacing: Duration::from_secs(1),
            cooldown: DEFAULT_COOLDOWN,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    /// Time of the last granted acquisition.
    last_granted: Option<Instant>,
    /// End of the current throttling cooldown.
    cooldown_until: Option<Instant>,
    /// Countdown task publishing the remaining seconds.
    countdown: Option<JoinHandle<()>>,
}

impl LimiterState {
    /// Earliest instant the next request may be granted.
    fn ready_at(&self, min_spacing: Duration) -> Option<Instant> {
        let spacing_ready = self.last_granted.map(|t| t + min_spacing);
        match (spacing_ready, self.cooldown_until) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

struct Shared {
    state: Mutex<LimiterState>,
    status: watch::Sender<RateLimitState>,
}

impl Shared {
    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// The worst case after recovery is slightly incorrect spacing, which is
    /// better than panicking.
    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Return to idle and forget the spacing clock.
    fn reset(&self) {
        let mut state = self.lock_state();
        state.last_granted = None;
        state.cooldown_until = None;
        if let Some(handle) = state.countdown.take() {
            handle.abort();
        }
        drop(state);
        self.status.send_replace(RateLimitState::idle());
    }
}

/// Per-provider rate limiter.
///
/// Thread-safe; share it behind the provider that owns it.
pub struct RateLimiter {
    provider: ProviderId,
    config: RateLimitConfig,
    shared: Arc<Shared>,
}

impl RateLimiter {
    /// Create an idle limiter for a provider.
    pub fn new(provider: impl Into<ProviderId>, config: RateLimitConfig) -> Self {
        let (status, _) = watch::channel(RateLimitState::idle());
        Self {
            provider: provider.into(),
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(LimiterState::default()),
                status,
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until a request may be sent, then record the grant.
    ///
    /// Suspends for the remaining spacing since the last grant and for any
    /// active throttling cooldown.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut state = self.shared.lock_state();
                let now = Instant::now();

                match state.ready_at(self.config.min_spacing) {
                    Some(ready) if ready > now => ready - now,
                    _ => {
                        state.last_granted = Some(now);
                        debug!("Rate limiter: granted request for '{}'", self.provider);
                        return;
                    }
                }
            };

            debug!(
                "Rate limiter: waiting {:?} for provider '{}'",
                wait_time, self.provider
            );
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Enter a throttling cooldown.
    ///
    /// Publishes a waiting state, replaces any running countdown with a new
    /// one that ticks once per second, and blocks [`acquire`](Self::acquire)
    /// until it reaches zero. Must be called from within a tokio runtime.
    pub fn report_throttled(&self, cooldown: Duration) {
        let seconds = cooldown.as_secs().max(1);
        let source = self.provider.to_string();

        warn!(
            "Provider '{}' throttled, cooling down for {}s",
            source, seconds
        );

        let mut state = self.shared.lock_state();
        let now = Instant::now();
        state.cooldown_until = Some(now + Duration::from_secs(seconds));
        if let Some(previous) = state.countdown.take() {
            previous.abort();
        }

        self.shared
            .status
            .send_replace(RateLimitState::waiting(&source, seconds));

        let shared = Arc::clone(&self.shared);
        state.countdown = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(now + COUNTDOWN_TICK, COUNTDOWN_TICK);
            let mut remaining = seconds;

            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if remaining > 0 {
                    shared
                        .status
                        .send_replace(RateLimitState::waiting(&source, remaining));
                }
            }

            info!("Provider '{}' cooldown finished", source);
            let mut state = shared.lock_state();
            state.last_granted = None;
            state.cooldown_until = None;
            state.countdown = None;
            drop(state);
            shared.status.send_replace(RateLimitState::idle());
        }));
    }

    /// Cancel any cooldown and return to idle immediately.
    pub fn clear(&self) {
        self.shared.reset();
    }

    /// Current throttling state.
    pub fn state(&self) -> RateLimitState {
        self.shared.status.borrow().clone()
    }

    /// Observe throttling state changes.
    pub fn subscribe(&self) -> watch::Receiver<RateLimitState> {
        self.shared.status.subscribe()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.lock_state().countdown.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(spacing_ms: u64) -> RateLimiter {
        RateLimiter::new(
            "TEST_PROVIDER",
            RateLimitConfig {
                min_spacing: Duration::from_millis(spacing_ms),
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = limiter(2_100);
        let start = Instant::now();

        limiter.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_enforces_min_spacing() {
        let limiter = limiter(2_100);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        let second = start.elapsed();
        limiter.acquire().await;
        let third = start.elapsed();

        assert!(second >= Duration::from_millis(2_100));
        assert!(third - second >= Duration::from_millis(2_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_spacing_already_elapsed() {
        let limiter = limiter(500);
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        let start = Instant::now();
        limiter.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_countdown_ticks_once_per_second() {
        let limiter = limiter(0);
        let mut rx = limiter.subscribe();
        let start = Instant::now();

        limiter.report_throttled(Duration::from_secs(3));
        assert_eq!(limiter.state(), RateLimitState::waiting("TEST_PROVIDER", 3));
        rx.borrow_and_update();

        let mut seen = Vec::new();
        loop {
            rx.changed().await.unwrap();
            let state = rx.borrow_and_update().clone();
            seen.push((state.is_waiting, state.seconds_remaining, start.elapsed()));
            if !state.is_waiting {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                (true, 2, Duration::from_secs(1)),
                (true, 1, Duration::from_secs(2)),
                (false, 0, Duration::from_secs(3)),
            ]
        );
        assert_eq!(limiter.state(), RateLimitState::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_cooldown() {
        let limiter = limiter(100);
        limiter.acquire().await;

        let start = Instant::now();
        limiter.report_throttled(Duration::from_secs(5));
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_throttle_replaces_running_countdown() {
        let limiter = limiter(0);
        let start = Instant::now();

        limiter.report_throttled(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(4)).await;
        limiter.report_throttled(Duration::from_secs(3));

        assert_eq!(limiter.state().seconds_remaining, 3);
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(7));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_returns_to_idle() {
        let limiter = limiter(0);
        limiter.report_throttled(Duration::from_secs(60));
        assert!(limiter.state().is_waiting);

        limiter.clear();

        assert_eq!(limiter.state(), RateLimitState::idle());
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
