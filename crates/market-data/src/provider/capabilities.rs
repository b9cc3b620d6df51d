//! Provider capabilities.
//!
//! Describes what a market-cap provider can return and how it locates a
//! token, so the orchestrator can skip providers that cannot serve it.

/// How a provider identifies a token upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenLookup {
    /// Looked up by chain and contract address.
    Contract,
    /// Looked up by ticker symbol through a search endpoint.
    Symbol,
}

/// Describes the capabilities of a market-cap provider.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Whether the provider returns a time series.
    ///
    /// Current-only providers answer with a single point at the request time.
    pub supports_historical: bool,

    /// How the provider locates a token.
    pub lookup: TokenLookup,
}
