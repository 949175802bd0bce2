// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::analysis::{
    analyze_game, analyze_position, AnalyzePgnRequest, AnalyzePositionRequest, ErrorBody,
    GameReport, PositionReport,
};
use crate::errors::AnalysisError;
use crate::http::error::{rejection_error, rejection_status, status_for};
use crate::http::AppState;
use crate::observability::messages::analysis::AnalysisRejected;
use crate::observability::messages::StructuredLog;
use crate::traits::ChessEngine;

fn rejected(kind: &str, error: &AnalysisError) {
    AnalysisRejected {
        kind,
        code: error.code(),
        error,
    }
    .log();
}

pub async fn analyze_pgn_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzePgnRequest>, JsonRejection>,
) -> (StatusCode, Json<GameReport>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = rejection_error(&rejection);
            rejected("game", &error);
            return (rejection_status(&rejection), Json(GameReport::failed(&error)));
        }
    };

    match analyze_game(&state.pool, &state.analysis, &request).await {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(error) => {
            rejected("game", &error);
            (status_for(&error), Json(GameReport::failed(&error)))
        }
    }
}

pub async fn analyze_position_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzePositionRequest>, JsonRejection>,
) -> (StatusCode, Json<PositionReport>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = rejection_error(&rejection);
            rejected("position", &error);
            return (
                rejection_status(&rejection),
                Json(PositionReport::failed(String::new(), &error)),
            );
        }
    };

    match analyze_position(&state.pool, &state.analysis, &request).await {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(error) => {
            rejected("position", &error);
            (
                status_for(&error),
                Json(PositionReport::failed(request.fen, &error)),
            )
        }
    }
}

pub async fn healthz_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready when an engine can be checked out and answers `isready`. Any
/// engine failure is a 503 here, whatever its code.
pub async fn readyz_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let checked = async {
        let mut engine = state.pool.checkout().await?;
        engine.ping().await
    }
    .await;

    match checked {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "pool": state.pool.stats() })),
        ),
        Err(error) => {
            let error = AnalysisError::Engine(error);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "pool": state.pool.stats(),
                    "error": ErrorBody::from(&error),
                })),
            )
        }
    }
}
