use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Range selection: a number of days, or everything the providers allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeArg {
    Days(u32),
    Max,
}

impl RangeArg {
    pub fn days(self) -> Option<u32> {
        match self {
            Self::Days(days) => Some(days),
            Self::Max => None,
        }
    }
}

fn parse_range(s: &str) -> Result<RangeArg, String> {
    let value = s.trim().to_ascii_lowercase();
    if value == "max" || value == "all" {
        return Ok(RangeArg::Max);
    }
    match value.parse::<u32>() {
        Ok(0) => Err("range must be at least 1 day".to_string()),
        Ok(days) => Ok(RangeArg::Days(days)),
        Err(_) => Err(format!(
            "invalid range '{}'; expected a number of days or 'max'",
            s
        )),
    }
}

/// Fetch and merge market-cap history for a token roster.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// History to fetch: a number of days, or 'max'
    #[arg(long, value_parser = parse_range, default_value = "30")]
    pub days: RangeArg,

    /// Token roster (JSON array of tokens); defaults to the built-in roster
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub tokens: Option<PathBuf>,

    /// Include tokens marked as disabled
    #[arg(long)]
    pub all: bool,

    /// Print the merged results as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log rate-limit countdowns as they tick
    #[arg(long)]
    pub watch_rate_limits: bool,
}
