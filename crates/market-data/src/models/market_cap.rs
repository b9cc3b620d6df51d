use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::Token;

/// One sample of a market-cap series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCapPoint {
    /// Milliseconds since the Unix epoch
    pub x: i64,
    /// Market capitalization in whole USD
    pub y: u64,
}

impl MarketCapPoint {
    pub fn new(x: i64, y: u64) -> Self {
        Self { x, y }
    }

    /// Build a point from a raw USD value, rounding to the nearest dollar.
    ///
    /// Returns `None` for non-finite or negative values.
    pub fn from_usd(x: i64, usd: f64) -> Option<Self> {
        if !usd.is_finite() || usd < 0.0 {
            return None;
        }
        Some(Self::new(x, usd.round() as u64))
    }
}

/// Sort points ascending by timestamp and drop repeated timestamps.
///
/// The sort is stable, so the first point seen for a timestamp wins.
pub fn normalize_series(mut points: Vec<MarketCapPoint>) -> Vec<MarketCapPoint> {
    points.sort_by_key(|p| p.x);
    points.dedup_by_key(|p| p.x);
    points
}

/// Where a [`FetchResult`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    GeckoTerminal,
    CoinGecko,
    DexScreener,
    /// Primary provider degraded to its current valuation only
    Fallback,
    None,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeckoTerminal => "geckoterminal",
            Self::CoinGecko => "coingecko",
            Self::DexScreener => "dexscreener",
            Self::Fallback => "fallback",
            Self::None => "none",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific identifiers that explain where a series came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_address: Option<String>,
}

/// Normalized output of a single provider for one token.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderSeries {
    pub data: Vec<MarketCapPoint>,
    pub current_market_cap: f64,
    pub current_price: f64,
    pub source: DataSource,
    pub provenance: Provenance,
}

impl ProviderSeries {
    pub fn new(source: DataSource, data: Vec<MarketCapPoint>) -> Self {
        Self {
            data: normalize_series(data),
            current_market_cap: 0.0,
            current_price: 0.0,
            source,
            provenance: Provenance::default(),
        }
    }

    pub fn with_current(mut self, market_cap: f64, price: f64) -> Self {
        self.current_market_cap = market_cap;
        self.current_price = price;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

/// Final per-token outcome produced by the orchestrator.
///
/// `error == true` together with an empty `data` is the terminal "no
/// provider had anything" state; it is a valid result, not a failure of
/// the call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    #[serde(flatten)]
    pub token: Token,
    pub data: Vec<MarketCapPoint>,
    pub current_market_cap: f64,
    pub current_price: f64,
    pub source: DataSource,
    pub error: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl FetchResult {
    pub fn from_series(token: Token, series: ProviderSeries) -> Self {
        Self {
            token,
            data: series.data,
            current_market_cap: series.current_market_cap,
            current_price: series.current_price,
            source: series.source,
            error: false,
            last_updated: Utc::now(),
            provenance: series.provenance,
        }
    }

    /// Terminal result for a token no provider could serve.
    pub fn failed(token: Token) -> Self {
        Self {
            token,
            data: Vec::new(),
            current_market_cap: 0.0,
            current_price: 0.0,
            source: DataSource::None,
            error: true,
            last_updated: Utc::now(),
            provenance: Provenance::default(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}
