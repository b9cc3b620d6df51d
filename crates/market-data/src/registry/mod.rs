//! Provider orchestration.
//!
//! This module provides:
//! - The fallback-chain orchestrator and its result cache
//! - Per-provider rate limiting with an observable throttling countdown
//! - Diagnostics describing which providers were tried for a token

mod diagnostics;
mod orchestrator;
mod rate_limit_state;
mod rate_limiter;

pub use diagnostics::{AttemptOutcome, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use orchestrator::{days_to_api_param, FetchOrchestrator, MAX_RANGE_DAYS};
pub use rate_limit_state::{RateLimitCallback, RateLimitState, RateLimitSubscription};
pub use rate_limiter::{RateLimitConfig, RateLimiter, DEFAULT_COOLDOWN, DEFAULT_MAX_RETRIES};
