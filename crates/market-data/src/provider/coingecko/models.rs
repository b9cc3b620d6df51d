//! CoinGecko API response models.

use serde::Deserialize;

use crate::provider::json::NumericRow;

/// Response of `/search`
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub coins: Vec<SearchCoin>,
    // Note: exchanges, categories and nfts exist but are not used
}

/// One coin in a search result
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchCoin {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

/// Response of `/coins/{id}/market_chart`
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    /// Rows of `[timestamp_ms, price]`
    #[serde(default)]
    pub prices: Vec<NumericRow>,
    /// Rows of `[timestamp_ms, market_cap]`
    pub market_caps: Vec<NumericRow>,
}
