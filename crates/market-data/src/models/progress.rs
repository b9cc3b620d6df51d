use std::sync::Arc;

use serde::Serialize;

use super::market_cap::FetchResult;

/// Progress marker emitted before each token of a batch fetch starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchProgress {
    /// 1-based position of the token about to be fetched
    pub current: usize,
    pub total: usize,
    /// Symbol of the token about to be fetched
    pub token: String,
}

/// Item of a streamed batch fetch.
#[derive(Clone, Debug)]
pub enum FetchEvent {
    Progress(FetchProgress),
    Completed(Arc<FetchResult>),
}
