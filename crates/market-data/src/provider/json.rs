//! Lenient numeric decoding shared by the provider payload models.
//!
//! Upstream APIs mix JSON numbers and numeric strings ("123.45") for the
//! same field, sometimes within one response.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64(self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => n,
            Self::String(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Decode an optional number that may arrive as a string.
///
/// `null`, unparsable strings and non-finite values all decode to `None`.
pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.and_then(NumberOrString::into_f64))
}

/// Decode a row of optional numbers, each of which may arrive as a string.
pub(crate) fn flexible_row<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let row = Vec::<Option<NumberOrString>>::deserialize(deserializer)?;
    Ok(row
        .into_iter()
        .map(|cell| cell.and_then(NumberOrString::into_f64))
        .collect())
}

/// A row of optional numbers, decoded leniently.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub(crate) struct NumericRow(#[serde(deserialize_with = "flexible_row")] pub Vec<Option<f64>>);

impl NumericRow {
    /// Value at `index`, if present and numeric.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }
}
