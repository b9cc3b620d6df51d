//! Token roster loading.

use std::path::Path;

use anyhow::Context;
use capwatch_market_data::Token;

const DEFAULT_ROSTER: &str = include_str!("../roster/default.json");

/// Built-in roster used when no file is given.
pub fn default_roster() -> anyhow::Result<Vec<Token>> {
    serde_json::from_str(DEFAULT_ROSTER).context("built-in roster is not valid JSON")
}

/// Read a roster file: a JSON array of tokens.
pub fn load(path: &Path) -> anyhow::Result<Vec<Token>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid roster {}", path.display()))
}

/// Tokens to fetch: enabled ones, or all of them.
pub fn select(roster: Vec<Token>, include_disabled: bool) -> Vec<Token> {
    roster
        .into_iter()
        .filter(|t| include_disabled || t.enabled)
        .collect()
}
