// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine process and pool events.
//!
//! This module contains message types for logging events related to:
//! * Engine process startup and the UCI handshake
//! * Failed exchanges and discarded processes
//! * Pool checkout, prewarm and shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Engine process spawned, handshake not yet done.
///
/// # Log Level
/// `debug!` - Routine lifecycle detail
pub struct EngineSpawned<'a> {
    pub path: &'a str,
    pub pid: Option<u32>,
}

impl Display for EngineSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "Spawned engine '{}' (pid {})", self.path, pid),
            None => write!(f, "Spawned engine '{}'", self.path),
        }
    }
}

impl StructuredLog for EngineSpawned<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, pid = self.pid, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("engine_spawn", span_name = name, path = self.path, pid = self.pid)
    }
}

/// UCI handshake finished and the engine reported ready.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pgn_analyzer::observability::messages::engine::EngineReady;
/// use std::time::Duration;
///
/// let msg = EngineReady {
///     name: "Stockfish 16",
///     option_count: 21,
///     duration: Duration::from_millis(35),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineReady<'a> {
    pub name: &'a str,
    pub option_count: usize,
    pub duration: Duration,
}

impl Display for EngineReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine '{}' ready: {} options advertised, handshake took {:?}",
            self.name, self.option_count, self.duration
        )
    }
}

impl StructuredLog for EngineReady<'_> {
    fn log(&self) {
        tracing::info!(
            engine = self.name,
            option_count = self.option_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine_ready",
            span_name = name,
            engine = self.name,
            option_count = self.option_count,
        )
    }
}

/// A configured UCI option was not advertised by the engine and was not sent.
///
/// # Log Level
/// `warn!` - Configuration does not match the engine
pub struct EngineOptionSkipped<'a> {
    pub engine: &'a str,
    pub option: &'a str,
}

impl Display for EngineOptionSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine '{}' does not support option '{}', skipping it",
            self.engine, self.option
        )
    }
}

impl StructuredLog for EngineOptionSkipped<'_> {
    fn log(&self) {
        tracing::warn!(engine = self.engine, option = self.option, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "engine_option_skipped",
            span_name = name,
            engine = self.engine,
            option = self.option,
        )
    }
}

/// An exchange with the engine failed.
///
/// # Log Level
/// `warn!` - The request fails, the service keeps running
///
/// # Example
/// ```
/// use pgn_analyzer::errors::EngineError;
/// use pgn_analyzer::observability::messages::engine::EngineExchangeFailed;
/// use std::time::Duration;
///
/// let error = EngineError::Timeout(Duration::from_secs(10));
/// let msg = EngineExchangeFailed {
///     engine: "Stockfish 16",
///     command: "go",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct EngineExchangeFailed<'a> {
    pub engine: &'a str,
    pub command: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for EngineExchangeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine '{}' failed during '{}': {}",
            self.engine, self.command, self.error
        )
    }
}

impl StructuredLog for EngineExchangeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            engine = self.engine,
            command = self.command,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "engine_exchange_failed",
            span_name = name,
            engine = self.engine,
            command = self.command,
        )
    }
}

/// An engine was dropped from the pool instead of being reused.
///
/// # Log Level
/// `warn!` - A replacement process will be spawned on demand
pub struct EngineDiscarded<'a> {
    pub engine: &'a str,
    pub reason: &'a str,
}

impl Display for EngineDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarding engine '{}': {}",
            self.engine, self.reason
        )
    }
}

impl StructuredLog for EngineDiscarded<'_> {
    fn log(&self) {
        tracing::warn!(engine = self.engine, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "engine_discarded",
            span_name = name,
            engine = self.engine,
            reason = self.reason,
        )
    }
}

/// Engine process stopped.
///
/// # Log Level
/// `debug!` - Routine lifecycle detail
pub struct EngineStopped<'a> {
    pub engine: &'a str,
    pub graceful: bool,
}

impl Display for EngineStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.graceful {
            write!(f, "Engine '{}' exited after quit", self.engine)
        } else {
            write!(f, "Engine '{}' killed after ignoring quit", self.engine)
        }
    }
}

impl StructuredLog for EngineStopped<'_> {
    fn log(&self) {
        tracing::debug!(engine = self.engine, graceful = self.graceful, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "engine_stopped",
            span_name = name,
            engine = self.engine,
            graceful = self.graceful,
        )
    }
}

/// An engine was handed to a request.
///
/// # Log Level
/// `debug!` - Per-request detail
pub struct EngineCheckedOut {
    pub reused: bool,
    pub in_use: usize,
    pub capacity: usize,
    pub waited: Duration,
}

impl Display for EngineCheckedOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Checked out {} engine ({}/{} in use) after waiting {:?}",
            if self.reused { "pooled" } else { "new" },
            self.in_use,
            self.capacity,
            self.waited
        )
    }
}

impl StructuredLog for EngineCheckedOut {
    fn log(&self) {
        tracing::debug!(
            reused = self.reused,
            in_use = self.in_use,
            capacity = self.capacity,
            waited_ms = self.waited.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "engine_checkout",
            span_name = name,
            reused = self.reused,
            in_use = self.in_use,
            capacity = self.capacity,
        )
    }
}

/// The boot-time engine could not be started.
///
/// # Log Level
/// `warn!` - The service starts anyway and retries on the first request
pub struct PoolPrewarmFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for PoolPrewarmFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not start an engine at boot, requests will retry: {}",
            self.error
        )
    }
}

impl StructuredLog for PoolPrewarmFailed<'_> {
    fn log(&self) {
        tracing::warn!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("pool_prewarm_failed", span_name = name)
    }
}

/// Pool closed; idle engines were told to quit.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PoolShutDown {
    pub stopped: usize,
}

impl Display for PoolShutDown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine pool shut down, {} idle engines stopped", self.stopped)
    }
}

impl StructuredLog for PoolShutDown {
    fn log(&self) {
        tracing::info!(stopped = self.stopped, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pool_shutdown", span_name = name, stopped = self.stopped)
    }
}
