use std::sync::Arc;

use serde::Serialize;

use super::market_cap::FetchResult;
use super::token::{Platform, Token};

/// Anything that can take part in variant merging.
pub trait VariantEntry {
    fn token(&self) -> &Token;

    /// Number of series points this entry carries.
    fn data_points(&self) -> usize;
}

impl VariantEntry for Token {
    fn token(&self) -> &Token {
        self
    }

    fn data_points(&self) -> usize {
        0
    }
}

impl VariantEntry for FetchResult {
    fn token(&self) -> &Token {
        &self.token
    }

    fn data_points(&self) -> usize {
        self.data.len()
    }
}

impl<T: VariantEntry> VariantEntry for Arc<T> {
    fn token(&self) -> &Token {
        self.as_ref().token()
    }

    fn data_points(&self) -> usize {
        self.as_ref().data_points()
    }
}

/// Manifest line describing one member of a merged group.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub id: String,
    pub platform: Platform,
    pub contract: String,
    pub data_points: usize,
}

/// An entry after variant merging.
///
/// Visible primaries of multi-chain groups carry `is_merged`, the full
/// `variants` manifest and the ids of the suppressed members. Suppressed
/// members carry `is_hidden_variant` and a back-reference to their primary.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedToken<T> {
    #[serde(flatten)]
    pub entry: T,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_merged: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hidden_variant_ids: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_hidden_variant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_variant_id: Option<String>,
}

impl<T> MergedToken<T> {
    /// Pass-through wrapper for a symbol that exists only once.
    pub fn single(entry: T) -> Self {
        Self {
            entry,
            is_merged: false,
            variants: Vec::new(),
            hidden_variant_ids: Vec::new(),
            is_hidden_variant: false,
            primary_variant_id: None,
        }
    }
}
