use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain a token contract lives on.
///
/// Unknown chain names are kept verbatim so providers can still pass them
/// through as a best-effort network identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Ethereum,
    Base,
    Solana,
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Base => "base",
            Self::Solana => "solana",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "ethereum" => Self::Ethereum,
            "base" => Self::Base,
            "solana" => Self::Solana,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked token: one instance per on-chain contract.
///
/// The same logical project may appear several times with different
/// platforms/contracts; see [`crate::merger`] for how those are collapsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub platform: Platform,
    pub contract: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub color: String,
}

fn default_enabled() -> bool {
    true
}

impl Token {
    /// Create an enabled token whose display name is its symbol.
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        platform: impl Into<Platform>,
        contract: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        Self {
            id: id.into(),
            name: symbol.clone(),
            symbol,
            platform: platform.into(),
            contract: contract.into(),
            enabled: true,
            color: String::new(),
        }
    }
}
