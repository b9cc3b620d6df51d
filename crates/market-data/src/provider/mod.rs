//! Market-cap provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketCapProvider` trait that all providers implement
//! - Provider capabilities
//! - The rate-limited HTTP plumbing shared by the HTTP providers
//! - Concrete providers, in fallback order: GeckoTerminal, CoinGecko, DexScreener
//!
//! # Architecture
//!
//! Each provider owns its rate limiter and its response caches, so two
//! providers never contend with each other. The orchestrator only sees the
//! trait and orders providers by priority.

mod capabilities;
mod http;
pub(crate) mod json;
mod traits;

pub mod coingecko;
pub mod dexscreener;
pub mod geckoterminal;

// Re-exports
pub use capabilities::{ProviderCapabilities, TokenLookup};
pub use coingecko::CoinGeckoProvider;
pub use dexscreener::DexScreenerProvider;
pub use geckoterminal::GeckoTerminalProvider;
pub use traits::MarketCapProvider;
