//! In-memory TTL caches.
//!
//! - [`TtlCache`]: generic time-bounded memoization used by each provider
//!   for its own request shapes
//! - [`ResultCache`]: orchestrator-level cache of final per-token results

mod result_cache;
mod ttl_cache;

pub use result_cache::{ResultCache, DEFAULT_RESULT_TTL};
pub use ttl_cache::TtlCache;
