//! Provider attempt tracking for fallback-chain diagnostics.

use crate::models::ProviderId;

/// Why a provider was skipped during a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider looks tokens up by contract and the token has none.
    MissingContract,
}

/// Outcome of asking one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { points: usize },
    /// Answered, but with an empty series.
    Empty,
    Failed { error: String },
    Skipped(SkipReason),
}

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub outcome: AttemptOutcome,
}

/// Detailed trace of one `fetch_one` call.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    /// Served from the orchestrator cache; no provider was asked.
    pub cache_hit: bool,
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, provider_id: ProviderId, outcome: AttemptOutcome) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            outcome,
        });
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.record(provider_id, AttemptOutcome::Skipped(reason));
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: String) {
        self.record(provider_id, AttemptOutcome::Failed { error });
    }

    pub fn record_empty(&mut self, provider_id: ProviderId) {
        self.record(provider_id, AttemptOutcome::Empty);
    }

    pub fn record_success(&mut self, provider_id: ProviderId, points: usize) {
        self.record(provider_id, AttemptOutcome::Success { points });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        if self.cache_hit {
            return "CACHE HIT".to_string();
        }

        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Success { points } => {
                    format!("{}: SUCCESS ({} points)", a.provider_id, points)
                }
                AttemptOutcome::Empty => format!("{}: EMPTY", a.provider_id),
                AttemptOutcome::Failed { error } => format!("{}: ERROR ({})", a.provider_id, error),
                AttemptOutcome::Skipped(reason) => {
                    format!("{}: SKIPPED ({:?})", a.provider_id, reason)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Success { .. }))
    }

    /// Provider that produced the result, if any.
    pub fn winner(&self) -> Option<&ProviderId> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Success { .. }))
            .map(|a| &a.provider_id)
    }

    /// Get all errors.
    pub fn errors(&self) -> Vec<(&ProviderId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Failed { error } => Some((&a.provider_id, error.as_str())),
                _ => None,
            })
            .collect()
    }
}
