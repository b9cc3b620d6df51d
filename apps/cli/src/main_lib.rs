use std::sync::Arc;

use anyhow::bail;
use capwatch_market_data::{
    days_to_api_param, display_tokens, merge_variants, CancellationToken, FetchEvent,
    FetchOrchestrator, RateLimitSubscription,
};
use futures::StreamExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{args::Cli, config::Config, render, roster};

/// Log output format selected by `CAPWATCH_LOG_FORMAT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber. Logs go to stderr in both formats so
/// stdout only carries results.
pub fn init_tracing() {
    let log_format = LogFormat::parse(std::env::var("CAPWATCH_LOG_FORMAT").ok().as_deref());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}

fn watch_rate_limits(orchestrator: &FetchOrchestrator) -> RateLimitSubscription {
    orchestrator.subscribe(|state| {
        if state.is_waiting {
            tracing::warn!(
                "{}",
                state.message.as_deref().unwrap_or("Rate limited, waiting...")
            );
        } else {
            tracing::info!("Rate limit cooldown finished");
        }
    })
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let roster = match &cli.tokens {
        Some(path) => roster::load(path)?,
        None => roster::default_roster()?,
    };
    let tokens = roster::select(roster, cli.all);
    if tokens.is_empty() {
        bail!("No tokens to fetch; enable some or pass --all");
    }

    let days = days_to_api_param(cli.days.days());
    let orchestrator = Arc::new(FetchOrchestrator::with_default_providers(&config.market)?);
    let _subscription = cli
        .watch_rate_limits
        .then(|| watch_rate_limits(&orchestrator));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing the token in flight");
            interrupt.cancel();
        }
    });

    tracing::info!("Fetching {} tokens over {} days", tokens.len(), days);
    let mut events = orchestrator.fetch_many_stream(tokens, days, cancel.clone());
    let mut results = Vec::new();

    while let Some(event) = events.next().await {
        match event {
            FetchEvent::Progress(p) => {
                tracing::info!("[{}/{}] Fetching {}...", p.current, p.total, p.token);
            }
            FetchEvent::Completed(result) => {
                if !result.has_data() {
                    tracing::warn!("{}: no data from any provider", result.token.symbol);
                }
                results.push(result);
            }
        }
    }

    if cancel.is_cancelled() {
        tracing::warn!("Showing {} tokens fetched before the interrupt", results.len());
    }

    let merged = merge_variants(results);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else {
        println!("{}", render::table(&display_tokens(&merged)));
    }

    Ok(())
}
