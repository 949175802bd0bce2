// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for game and position analysis requests.

use serde_json::{json, Value};
use thiserror::Error;

use crate::chess::{FenError, PgnError};
use crate::errors::EngineError;

/// Where replaying a game hit its first illegal move.
#[derive(Debug, Clone, PartialEq)]
pub struct IllegalMoveDetail {
    pub ply: usize,
    pub san: String,
    /// Only known when the SAN names a move that breaks king safety.
    pub uci: Option<String>,
    pub fen_before: String,
}

/// Everything that can stop an analysis request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The request itself is unusable (bad JSON, limits out of range).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The PGN could not be read, or a movetext token is not SAN.
    #[error("Could not parse PGN: {message}")]
    InvalidPgn { message: String, details: Value },

    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] FenError),

    #[error("Move {} at ply {} is not legal from reconstructed position", .0.san, .0.ply)]
    IllegalMove(IllegalMoveDetail),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidRequest(_) => "INVALID_REQUEST",
            AnalysisError::InvalidPgn { .. } => "INVALID_PGN",
            AnalysisError::InvalidFen(_) => "INVALID_FEN",
            AnalysisError::IllegalMove(_) => "ILLEGAL_MOVE",
            AnalysisError::Engine(err) => err.code(),
        }
    }

    /// Structured details for the response envelope.
    pub fn details(&self) -> Value {
        match self {
            AnalysisError::InvalidPgn { details, .. } => details.clone(),
            AnalysisError::IllegalMove(detail) => json!({
                "first_illegal_move": {
                    "ply": detail.ply,
                    "san": detail.san,
                    "uci": detail.uci,
                    "fen_before": detail.fen_before,
                }
            }),
            _ => json!({}),
        }
    }
}

impl From<PgnError> for AnalysisError {
    fn from(err: PgnError) -> Self {
        AnalysisError::InvalidPgn {
            message: err.to_string(),
            details: json!({}),
        }
    }
}
