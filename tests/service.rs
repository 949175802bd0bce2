// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The whole service over HTTP, with engine processes behind it.
//!
//! The fake engine always answers `e2e4`/`d2d4`, so these tests stick to
//! positions where those moves are legal. `real_stockfish_game` needs a
//! Stockfish binary and is ignored by default:
//! `cargo test --test service -- --ignored`.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use pgn_analyzer::config::{AnalysisConfig, EngineConfig};
use pgn_analyzer::engine::{EnginePool, UciLauncher};
use pgn_analyzer::http::{build_router, serve, AppState};

const FAKE_ENGINE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fake_engine.sh");

async fn start(engine: EngineConfig) -> (SocketAddr, EnginePool) {
    let pool = EnginePool::new(
        Arc::new(UciLauncher::new(engine.clone())),
        engine.pool_size,
        Duration::from_secs(5),
    );
    let app = build_router(
        AppState::new(pool.clone(), AnalysisConfig::default()),
        1024 * 1024,
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, app, std::future::pending()));
    (addr, pool)
}

fn fake_engine(mode: &str) -> EngineConfig {
    EngineConfig {
        path: "sh".to_string(),
        args: vec![FAKE_ENGINE.to_string(), mode.to_string()],
        search_paths: Vec::new(),
        response_grace_ms: 300,
        ..EngineConfig::default()
    }
}

async fn post(addr: SocketAddr, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn position_analysis_through_engine_process() {
    let (addr, pool) = start(fake_engine("normal")).await;
    let (status, body) = post(
        addr,
        "/analyze_position",
        json!({ "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "multipv": 2 }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["eval_cp"], 31);
    assert_eq!(body["best_move"]["uci"], "e2e4");
    assert_eq!(body["best_move"]["san"], "e4");
    assert_eq!(body["multipv"][1]["san"], "d4");
    assert_eq!(pool.stats().idle, 1);
}

#[tokio::test]
async fn engine_statuses_through_engine_process() {
    let cases = vec![
        ("silent", 504, "ENGINE_TIMEOUT"),
        ("garbage", 502, "ENGINE_PROTOCOL_ERROR"),
        ("crash", 503, "ENGINE_UNAVAILABLE"),
    ];
    for (mode, expected_status, expected_code) in cases {
        let (addr, pool) = start(fake_engine(mode)).await;
        let (status, body) = post(
            addr,
            "/analyze_position",
            json!({ "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1" }),
        )
        .await;
        assert_eq!(status, expected_status, "{mode}");
        assert_eq!(body["error"]["code"], expected_code, "{mode}");
        assert_eq!(pool.stats().idle, 0, "{mode}");
    }
}

#[tokio::test]
async fn missing_engine_binary_is_503() {
    let (addr, _) = start(EngineConfig {
        path: "/nonexistent/stockfish".to_string(),
        search_paths: Vec::new(),
        ..EngineConfig::default()
    })
    .await;
    let (status, body) = post(addr, "/analyze_pgn", json!({ "pgn": "1. e4 e5" })).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], "ENGINE_UNAVAILABLE");
}

#[tokio::test]
#[ignore]
async fn real_stockfish_game() {
    let (addr, _) = start(EngineConfig {
        options: BTreeMap::from([("Threads".to_string(), "1".to_string())]),
        ..EngineConfig::default()
    })
    .await;

    let (status, body) = post(
        addr,
        "/analyze_pgn",
        json!({
            "pgn": "1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6?? 4. Qxf7# 1-0",
            "depth": 8,
            "multipv": 3,
        }),
    )
    .await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "ok");
    let per_ply = body["per_ply"].as_array().unwrap();
    assert_eq!(per_ply.len(), 7);
    assert_eq!(per_ply[6]["eval_cp"], 100_000);
    // After 3...Nf6?? White mates in one.
    assert_eq!(per_ply[5]["eval_cp"], 100_000);
    assert_eq!(per_ply[5]["multipv"][0]["san"], "Qxf7#");
    assert_eq!(body["key_moments"][0]["ply"], 6);
}
