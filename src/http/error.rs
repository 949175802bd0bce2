// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::errors::{AnalysisError, EngineError};

/// HTTP status for an analysis failure.
pub fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AnalysisError::InvalidPgn { .. }
        | AnalysisError::InvalidFen(_)
        | AnalysisError::IllegalMove(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::Engine(engine) => engine_status(engine),
    }
}

pub fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::ProcessUnavailable(_) | EngineError::PoolExhausted(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        EngineError::Protocol(_) => StatusCode::BAD_GATEWAY,
        EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Body that could not be read as the expected JSON. Oversized bodies keep
/// their 413; everything else is a 400.
pub fn rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    }
}

pub fn rejection_error(rejection: &JsonRejection) -> AnalysisError {
    AnalysisError::InvalidRequest(rejection.body_text())
}
