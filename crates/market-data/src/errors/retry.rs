/// Classification for retry policy.
///
/// Used to determine how a failed upstream call is handled.
///
/// # Behavior Summary
///
/// | Class | Same provider again? | Try next provider? |
/// |-------|---------------------|--------------------|
/// | `RetrySameProvider` | Yes, after cooldown (bounded) | Once retries are spent |
/// | `NextProvider` | No | Yes |
/// | `Exhausted` | No | Nothing left to try |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The provider throttled us (HTTP 429).
    ///
    /// The rate limiter enters a cooldown and the same request is retried,
    /// at most `max_retries` times. When the budget is spent the request
    /// fails and the orchestrator moves on to the next provider.
    RetrySameProvider,

    /// Move to the next provider without retrying this one.
    ///
    /// Used for transient network failures, empty responses and payloads
    /// that do not match the expected schema.
    NextProvider,

    /// Every provider in the chain has been tried.
    Exhausted,
}
