//! Observable throttling state of a provider.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Snapshot of a provider's throttling cooldown, suitable for a UI banner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub is_waiting: bool,
    pub source: Option<String>,
    pub seconds_remaining: u64,
    pub message: Option<String>,
}

impl RateLimitState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn waiting(source: &str, seconds_remaining: u64) -> Self {
        Self {
            is_waiting: true,
            source: Some(source.to_string()),
            seconds_remaining,
            message: Some(format!(
                "{} rate limited, waiting {}s...",
                source, seconds_remaining
            )),
        }
    }
}

/// Callback invoked with every state change of any provider.
pub type RateLimitCallback = Arc<dyn Fn(RateLimitState) + Send + Sync>;

/// Handle returned by a callback subscription.
///
/// Forwarding stops on [`unsubscribe`](Self::unsubscribe) or when the
/// handle is dropped.
pub struct RateLimitSubscription {
    forwarders: Vec<JoinHandle<()>>,
}

impl RateLimitSubscription {
    /// Forward changes from every receiver to `callback`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        receivers: Vec<watch::Receiver<RateLimitState>>,
        callback: RateLimitCallback,
    ) -> Self {
        let forwarders = receivers
            .into_iter()
            .map(|mut rx| {
                let callback = Arc::clone(&callback);
                tokio::spawn(async move {
                    while rx.changed().await.is_ok() {
                        let state = rx.borrow_and_update().clone();
                        callback(state);
                    }
                })
            })
            .collect();

        Self { forwarders }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for RateLimitSubscription {
    fn drop(&mut self) {
        for handle in &self.forwarders {
            handle.abort();
        }
    }
}
