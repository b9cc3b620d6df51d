//! GeckoTerminal API response models.
//!
//! Only the fields used for market-cap reconstruction are mapped. Numeric
//! attributes arrive as strings in practice and are decoded leniently.

use serde::Deserialize;

use crate::provider::json::{flexible_f64, NumericRow};

/// Response of `/networks/{network}/tokens/{address}`
#[derive(Debug, Deserialize)]
pub struct TokenInfoResponse {
    pub data: TokenInfoData,
}

#[derive(Debug, Deserialize)]
pub struct TokenInfoData {
    #[serde(default)]
    pub attributes: TokenAttributes,
}

/// Token-level valuation attributes
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenAttributes {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub fdv_usd: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub market_cap_usd: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub price_usd: Option<f64>,
}

/// Response of `/networks/{network}/tokens/{address}/pools`
#[derive(Debug, Deserialize)]
pub struct PoolsResponse {
    pub data: Vec<PoolData>,
}

#[derive(Debug, Deserialize)]
pub struct PoolData {
    pub attributes: PoolAttributes,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PoolAttributes {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub reserve_in_usd: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub base_token_price_usd: Option<f64>,
}

/// Response of `/networks/{network}/pools/{pool}/ohlcv/{timeframe}`
#[derive(Debug, Deserialize)]
pub struct OhlcvResponse {
    pub data: OhlcvData,
}

#[derive(Debug, Deserialize)]
pub struct OhlcvData {
    pub attributes: OhlcvAttributes,
}

#[derive(Debug, Deserialize)]
pub struct OhlcvAttributes {
    /// Rows of `[timestamp_secs, open, high, low, close, volume]`
    pub ohlcv_list: Vec<NumericRow>,
}
