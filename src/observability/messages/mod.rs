// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with typed fields at the right
//! level.
//!
//! # Organization
//!
//! * `engine` - engine process lifecycle and pool events
//! * `analysis` - analysis request lifecycle
//! * `server` - listener and shutdown events
//!
//! # Usage Pattern
//!
//! ```rust
//! use pgn_analyzer::observability::messages::StructuredLog;
//! use pgn_analyzer::observability::messages::server::ServerListening;
//!
//! ServerListening { addr: "0.0.0.0:8000" }.log();
//! ```

use tracing::Span;

pub mod analysis;
pub mod engine;
pub mod server;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event at the message's level.
    fn log(&self);

    /// A span carrying the message's fields, for wrapping the work it describes.
    fn span(&self, name: &str) -> Span;
}
