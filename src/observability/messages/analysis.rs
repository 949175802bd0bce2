// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for analysis requests.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Analysis request accepted and about to hit the engine.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pgn_analyzer::observability::messages::analysis::AnalysisStarted;
///
/// let msg = AnalysisStarted {
///     kind: "game",
///     positions: 42,
///     depth: 12,
///     multipv: 2,
///     movetime_ms: Some(50),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct AnalysisStarted<'a> {
    pub kind: &'a str,
    pub positions: usize,
    pub depth: u32,
    pub multipv: u32,
    pub movetime_ms: Option<u64>,
}

impl Display for AnalysisStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} analysis: {} positions, depth={}, multipv={}",
            self.kind, self.positions, self.depth, self.multipv
        )?;
        if let Some(ms) = self.movetime_ms {
            write!(f, ", movetime={}ms", ms)?;
        }
        Ok(())
    }
}

impl StructuredLog for AnalysisStarted<'_> {
    fn log(&self) {
        tracing::info!(
            kind = self.kind,
            positions = self.positions,
            depth = self.depth,
            multipv = self.multipv,
            movetime_ms = self.movetime_ms,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "analysis",
            span_name = name,
            kind = self.kind,
            positions = self.positions,
            depth = self.depth,
            multipv = self.multipv,
        )
    }
}

/// Analysis finished for every requested position.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AnalysisCompleted<'a> {
    pub kind: &'a str,
    pub positions: usize,
    pub duration: Duration,
}

impl Display for AnalysisCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Completed {} analysis of {} positions in {:?}",
            self.kind, self.positions, self.duration
        )
    }
}

impl StructuredLog for AnalysisCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            kind = self.kind,
            positions = self.positions,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "analysis_completed",
            span_name = name,
            kind = self.kind,
            positions = self.positions,
            duration = ?self.duration,
        )
    }
}

/// Request rejected before or during analysis.
///
/// # Log Level
/// `warn!` - Client or engine problem, service unaffected
pub struct AnalysisRejected<'a> {
    pub kind: &'a str,
    pub code: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for AnalysisRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected {} analysis with {}: {}",
            self.kind, self.code, self.error
        )
    }
}

impl StructuredLog for AnalysisRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            kind = self.kind,
            code = self.code,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "analysis_rejected",
            span_name = name,
            kind = self.kind,
            code = self.code,
        )
    }
}

/// The engine failed part way through a game; earlier plies are still returned.
///
/// # Log Level
/// `warn!` - Partial result
pub struct AnalysisInterrupted<'a> {
    pub analysed: usize,
    pub total: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for AnalysisInterrupted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Game analysis interrupted after {}/{} plies: {}",
            self.analysed, self.total, self.error
        )
    }
}

impl StructuredLog for AnalysisInterrupted<'_> {
    fn log(&self) {
        tracing::warn!(
            analysed = self.analysed,
            total = self.total,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "analysis_interrupted",
            span_name = name,
            analysed = self.analysed,
            total = self.total,
        )
    }
}
