// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HTTP surface: routes, shared state and the listener.

pub mod error;
pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::AnalysisConfig;
use crate::engine::EnginePool;

pub use server::{serve, shutdown_signal};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: EnginePool,
    pub analysis: Arc<AnalysisConfig>,
}

impl AppState {
    pub fn new(pool: EnginePool, analysis: AnalysisConfig) -> Self {
        Self {
            pool,
            analysis: Arc::new(analysis),
        }
    }
}

pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/analyze_pgn", post(handlers::analyze_pgn_handler))
        .route("/analyze_position", post(handlers::analyze_position_handler))
        .route("/healthz", get(handlers::healthz_handler))
        .route("/readyz", get(handlers::readyz_handler))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
}
