// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log lines are produced by message types in [`messages`] rather than by
//! ad-hoc format strings, so every event has one wording and one set of
//! structured fields. [`init_tracing`] installs the global subscriber.
//!
//! # Usage
//!
//! ```rust
//! use pgn_analyzer::observability::messages::StructuredLog;
//! use pgn_analyzer::observability::messages::engine::EngineDiscarded;
//!
//! EngineDiscarded {
//!     engine: "Stockfish 16",
//!     reason: "timed out",
//! }
//! .log();
//! ```

pub mod messages;

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::consts::DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
