//! DexScreener API response models.

use serde::Deserialize;

use crate::provider::json::flexible_f64;

/// Response of `/latest/dex/tokens/{address}`
///
/// `pairs` is `null` when the token has no pairs.
#[derive(Debug, Deserialize)]
pub struct TokenPairsResponse {
    pub pairs: Option<Vec<Pair>>,
}

/// A trading pair that includes the requested token
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub chain_id: String,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub fdv: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub market_cap: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Liquidity {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub usd: Option<f64>,
}

impl Pair {
    pub fn liquidity_usd(&self) -> Option<f64> {
        self.liquidity.as_ref().and_then(|l| l.usd)
    }
}
