use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use capwatch_market_data::{
    DataSource, FetchOrchestrator, MarketDataConfig, ProviderConfig, RateLimitState, Token,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Canned upstream behavior; the default has no pools and no pairs.
#[derive(Default)]
struct Upstream {
    throttle_geckoterminal: bool,
    /// Serve two pools, the deeper one at `0xp2`.
    pools: bool,
    /// Answer OHLCV requests with 404.
    ohlcv_missing: bool,
    /// Answer CoinGecko search with 500.
    coingecko_down: bool,
    /// Serve pairs on base and solana.
    dex_pairs: bool,
    geckoterminal_hits: AtomicUsize,
    coingecko_hits: AtomicUsize,
    dexscreener_hits: AtomicUsize,
}

type Shared = Arc<Upstream>;

fn throttled() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response()
}

async fn gt_token_info(State(upstream): State<Shared>) -> Response {
    upstream.geckoterminal_hits.fetch_add(1, Ordering::SeqCst);
    if upstream.throttle_geckoterminal {
        return throttled();
    }
    Json(json!({
        "data": {
            "id": "base_0xaaa",
            "type": "token",
            "attributes": {
                "symbol": "AAA",
                "fdv_usd": "1000000.0",
                "market_cap_usd": "2000000.0",
                "price_usd": "1.0"
            }
        }
    }))
    .into_response()
}

async fn gt_pools(State(upstream): State<Shared>) -> Response {
    upstream.geckoterminal_hits.fetch_add(1, Ordering::SeqCst);
    if upstream.throttle_geckoterminal {
        return throttled();
    }
    if !upstream.pools {
        return Json(json!({ "data": [] })).into_response();
    }
    Json(json!({
        "data": [
            {"id": "base_0xp1", "attributes": {"address": "0xp1", "reserve_in_usd": "100.5", "base_token_price_usd": "1.0"}},
            {"id": "base_0xp2", "attributes": {"address": "0xp2", "reserve_in_usd": "5000.0", "base_token_price_usd": "1.0"}}
        ]
    }))
    .into_response()
}

async fn gt_ohlcv(
    State(upstream): State<Shared>,
    Path((_network, pool, _timeframe)): Path<(String, String, String)>,
) -> Response {
    upstream.geckoterminal_hits.fetch_add(1, Ordering::SeqCst);
    if upstream.ohlcv_missing || pool != "0xp2" {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    Json(json!({
        "data": {
            "id": "ohlcv",
            "attributes": {
                "ohlcv_list": [
                    [1700003600, 1.2, 1.6, 1.1, 1.5, 900.0],
                    [1700000000, 0.9, 1.1, 0.8, 1.0, 1200.0]
                ]
            }
        }
    }))
    .into_response()
}

async fn cg_search(State(upstream): State<Shared>) -> Response {
    upstream.coingecko_hits.fetch_add(1, Ordering::SeqCst);
    if upstream.coingecko_down {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    Json(json!({
        "coins": [
            {"id": "aaa-token", "name": "AAA Token", "symbol": "AAA", "market_cap_rank": 900}
        ],
        "exchanges": []
    }))
    .into_response()
}

async fn cg_market_chart(State(upstream): State<Shared>) -> Json<serde_json::Value> {
    upstream.coingecko_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "prices": [
            [1700000000000u64, 0.50],
            [1700086400000u64, 0.55],
            [1700172800000u64, 0.61]
        ],
        "market_caps": [
            [1700086400000u64, 5500000.0],
            [1700000000000u64, 5000000.0],
            [1700172800000u64, 6100000.0]
        ],
        "total_volumes": []
    }))
}

async fn ds_pairs(State(upstream): State<Shared>) -> Json<serde_json::Value> {
    upstream.dexscreener_hits.fetch_add(1, Ordering::SeqCst);
    if !upstream.dex_pairs {
        return Json(json!({ "schemaVersion": "1.0.0", "pairs": null }));
    }
    Json(json!({
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "solana",
                "pairAddress": "SoLpair",
                "priceUsd": "0.2",
                "liquidity": {"usd": 90000.0},
                "marketCap": 999
            },
            {
                "chainId": "base",
                "pairAddress": "0xbasepair",
                "priceUsd": "0.1",
                "liquidity": {"usd": 1000.0},
                "fdv": 150,
                "marketCap": 100
            },
            {
                "chainId": "base",
                "pairAddress": "0xshallow",
                "priceUsd": "0.1",
                "liquidity": {"usd": 10.0},
                "fdv": 50
            }
        ]
    }))
}

async fn spawn_upstream(upstream: Shared) -> String {
    let app = Router::new()
        .route("/gt/networks/{network}/tokens/{address}", get(gt_token_info))
        .route(
            "/gt/networks/{network}/tokens/{address}/pools",
            get(gt_pools),
        )
        .route(
            "/gt/networks/{network}/pools/{pool}/ohlcv/{timeframe}",
            get(gt_ohlcv),
        )
        .route("/cg/search", get(cg_search))
        .route("/cg/coins/{id}/market_chart", get(cg_market_chart))
        .route("/ds/latest/dex/tokens/{address}", get(ds_pairs))
        .with_state(upstream);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn local_provider(base: ProviderConfig, url: String) -> ProviderConfig {
    let mut config = base.with_base_url(url);
    config.rate_limit.min_spacing = Duration::ZERO;
    config.request_timeout = Duration::from_secs(5);
    config
}

fn test_config(root: &str) -> MarketDataConfig {
    MarketDataConfig {
        geckoterminal: local_provider(ProviderConfig::geckoterminal(), format!("{}/gt", root)),
        coingecko: local_provider(ProviderConfig::coingecko(), format!("{}/cg", root)),
        dexscreener: local_provider(ProviderConfig::dexscreener(), format!("{}/ds", root)),
        ..MarketDataConfig::default()
    }
}

fn aaa() -> Token {
    Token::new(
        "aaa-base",
        "AAA",
        "base",
        "0x00000000000000000000000000000000000000aa",
    )
}

#[tokio::test]
async fn falls_back_to_market_chart_when_no_pools() {
    let upstream = Arc::new(Upstream::default());
    let root = spawn_upstream(Arc::clone(&upstream)).await;
    let orchestrator = FetchOrchestrator::with_default_providers(&test_config(&root)).unwrap();

    let (result, diagnostics) = orchestrator.fetch_one_with_diagnostics(&aaa(), 30).await;

    assert!(!result.error, "diagnostics: {}", diagnostics.summary());
    assert_eq!(result.source, DataSource::CoinGecko);
    assert_eq!(result.data.len(), 3);
    assert!(result.data.windows(2).all(|w| w[0].x < w[1].x));
    assert_eq!(result.data[0].y, 5_000_000);
    assert_eq!(result.current_market_cap, 6_100_000.0);
    assert_eq!(result.current_price, 0.61);
    assert_eq!(result.provenance.coin_id.as_deref(), Some("aaa-token"));

    assert_eq!(upstream.geckoterminal_hits.load(Ordering::SeqCst), 2);
    assert_eq!(upstream.coingecko_hits.load(Ordering::SeqCst), 2);
    assert_eq!(upstream.dexscreener_hits.load(Ordering::SeqCst), 0);

    // Served from the result cache.
    let again = orchestrator.fetch_one(&aaa(), 30).await;
    assert!(Arc::ptr_eq(&result, &again));
    assert_eq!(upstream.coingecko_hits.load(Ordering::SeqCst), 2);

    // Clearing every cache forces fresh upstream calls.
    orchestrator.clear_all_caches();
    orchestrator.fetch_one(&aaa(), 30).await;
    assert_eq!(upstream.coingecko_hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn deepest_pool_candles_scaled_by_supply() {
    let upstream = Arc::new(Upstream {
        pools: true,
        ..Upstream::default()
    });
    let root = spawn_upstream(Arc::clone(&upstream)).await;
    let orchestrator = FetchOrchestrator::with_default_providers(&test_config(&root)).unwrap();

    let (result, diagnostics) = orchestrator.fetch_one_with_diagnostics(&aaa(), 7).await;

    assert!(result.has_data(), "diagnostics: {}", diagnostics.summary());
    assert_eq!(result.source, DataSource::GeckoTerminal);
    // Supply is fdv / price = 1M; closes 1.0 and 1.5, sorted by time.
    let points: Vec<(i64, u64)> = result.data.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(
        points,
        vec![(1_700_000_000_000, 1_000_000), (1_700_003_600_000, 1_500_000)]
    );
    assert_eq!(result.current_market_cap, 1_000_000.0);
    assert_eq!(result.current_price, 1.0);
    assert_eq!(result.provenance.pool_address.as_deref(), Some("0xp2"));
    assert_eq!(result.provenance.liquidity_usd, Some(5000.0));

    // Token info, pools, OHLCV; nothing further down the chain.
    assert_eq!(upstream.geckoterminal_hits.load(Ordering::SeqCst), 3);
    assert_eq!(upstream.coingecko_hits.load(Ordering::SeqCst), 0);
    assert_eq!(upstream.dexscreener_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_candles_degrade_to_current_valuation() {
    let upstream = Arc::new(Upstream {
        pools: true,
        ohlcv_missing: true,
        ..Upstream::default()
    });
    let root = spawn_upstream(Arc::clone(&upstream)).await;
    let orchestrator = FetchOrchestrator::with_default_providers(&test_config(&root)).unwrap();

    let before = chrono::Utc::now().timestamp_millis();
    let result = orchestrator.fetch_one(&aaa(), 30).await;
    let after = chrono::Utc::now().timestamp_millis();

    assert!(!result.error);
    assert_eq!(result.source, DataSource::Fallback);
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].y, 2_000_000);
    assert!((before..=after).contains(&result.data[0].x));
    assert_eq!(result.current_market_cap, 2_000_000.0);
    assert_eq!(result.provenance.pool_address.as_deref(), Some("0xp2"));
    assert_eq!(upstream.coingecko_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dexscreener_answers_when_charts_are_unavailable() {
    let upstream = Arc::new(Upstream {
        coingecko_down: true,
        dex_pairs: true,
        ..Upstream::default()
    });
    let root = spawn_upstream(Arc::clone(&upstream)).await;
    let orchestrator = FetchOrchestrator::with_default_providers(&test_config(&root)).unwrap();

    let (result, diagnostics) = orchestrator.fetch_one_with_diagnostics(&aaa(), 30).await;

    assert_eq!(result.source, DataSource::DexScreener);
    assert_eq!(result.data.len(), 1);
    // The deeper solana pair is ignored for a base token.
    assert_eq!(result.data[0].y, 100);
    assert_eq!(result.current_market_cap, 100.0);
    assert_eq!(result.current_price, 0.1);
    assert_eq!(result.provenance.pair_address.as_deref(), Some("0xbasepair"));
    assert_eq!(result.provenance.liquidity_usd, Some(1000.0));

    assert_eq!(diagnostics.errors().len(), 2);
    assert_eq!(diagnostics.winner().map(|id| &**id), Some("DEXSCREENER"));
    assert_eq!(upstream.dexscreener_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn throttled_primary_cools_down_then_falls_back() {
    let upstream = Arc::new(Upstream {
        throttle_geckoterminal: true,
        ..Upstream::default()
    });
    let root = spawn_upstream(Arc::clone(&upstream)).await;
    let config = test_config(&root)
        .with_cooldown(Duration::from_secs(1))
        .with_max_retries(1);
    let orchestrator = FetchOrchestrator::with_default_providers(&config).unwrap();

    let (states_tx, mut states_rx) = mpsc::unbounded_channel::<RateLimitState>();
    let subscription = orchestrator.subscribe(move |state| {
        let _ = states_tx.send(state);
    });

    let result = orchestrator.fetch_one(&aaa(), 30).await;

    assert_eq!(result.source, DataSource::CoinGecko);
    assert_eq!(result.data.len(), 3);
    // Token info and pools are each tried once and retried once.
    assert_eq!(upstream.geckoterminal_hits.load(Ordering::SeqCst), 4);

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        let mut saw_waiting = false;
        while let Some(state) = states_rx.recv().await {
            if state.is_waiting {
                assert_eq!(state.source.as_deref(), Some("GeckoTerminal"));
                saw_waiting = true;
            } else if saw_waiting {
                return true;
            }
        }
        false
    })
    .await;
    assert!(matches!(settled, Ok(true)));

    subscription.unsubscribe();
}
