// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while talking to an engine process.

use std::time::Duration;
use thiserror::Error;

/// Failure of an exchange with a UCI engine process.
///
/// Any of these leaves the engine in an unknown protocol state, so the pool
/// discards the process that produced it instead of handing it out again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine could not be started, exited, or closed one of its pipes.
    #[error("Engine process unavailable: {0}")]
    ProcessUnavailable(String),

    /// The engine answered with something the adapter cannot interpret.
    #[error("Engine protocol error: {0}")]
    Protocol(String),

    /// The engine did not produce the expected terminator in time.
    #[error("Engine did not respond within {0:?}")]
    Timeout(Duration),

    /// Every pooled engine stayed busy for the whole checkout window.
    #[error("No engine became available within {0:?}")]
    PoolExhausted(Duration),
}

impl EngineError {
    /// Stable machine-readable code used in response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ProcessUnavailable(_) => "ENGINE_UNAVAILABLE",
            EngineError::Protocol(_) => "ENGINE_PROTOCOL_ERROR",
            EngineError::Timeout(_) => "ENGINE_TIMEOUT",
            EngineError::PoolExhausted(_) => "ENGINE_BUSY",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ProcessUnavailable(err.to_string())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
