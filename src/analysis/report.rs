// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Response envelopes.
//!
//! Every response carries `status` and `error`, success or not, so clients
//! can branch on one field instead of on the HTTP status alone.

use serde::Serialize;
use serde_json::Value;

use crate::errors::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// Some plies were analysed before the engine failed.
    Partial,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Value,
}

impl From<&AnalysisError> for ErrorBody {
    fn from(err: &AnalysisError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

/// One candidate line: the first move of the pv and its evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PvEntry {
    pub rank: u32,
    pub uci: String,
    pub san: String,
    pub eval_cp: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlyReport {
    pub ply: usize,
    pub played_uci: String,
    pub played_san: String,
    /// Position after the move.
    pub fen: String,
    /// Rank-1 evaluation from White's point of view.
    pub eval_cp: Option<i32>,
    pub delta_cp: Option<i32>,
    pub multipv: Vec<PvEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReport {
    pub status: Status,
    pub legal: bool,
    pub per_ply: Vec<PlyReport>,
    pub key_moments: Vec<PlyReport>,
    pub error: Option<ErrorBody>,
}

impl GameReport {
    pub fn complete(per_ply: Vec<PlyReport>, key_count: usize) -> Self {
        Self {
            status: Status::Ok,
            legal: true,
            key_moments: key_moments(&per_ply, key_count),
            per_ply,
            error: None,
        }
    }

    pub fn partial(per_ply: Vec<PlyReport>, key_count: usize, error: &AnalysisError) -> Self {
        Self {
            status: Status::Partial,
            legal: true,
            key_moments: key_moments(&per_ply, key_count),
            per_ply,
            error: Some(error.into()),
        }
    }

    pub fn failed(error: &AnalysisError) -> Self {
        Self {
            status: Status::Error,
            legal: false,
            per_ply: Vec::new(),
            key_moments: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The `count` plies with the largest absolute swing. Ties keep game order.
pub fn key_moments(per_ply: &[PlyReport], count: usize) -> Vec<PlyReport> {
    let mut swings: Vec<&PlyReport> = per_ply.iter().filter(|p| p.delta_cp.is_some()).collect();
    swings.sort_by_key(|p| std::cmp::Reverse(p.delta_cp.map_or(0, i32::unsigned_abs)));
    swings.into_iter().take(count).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestMoveReport {
    pub uci: String,
    pub san: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub status: Status,
    pub fen: String,
    pub eval_cp: Option<i32>,
    pub best_move: Option<BestMoveReport>,
    pub multipv: Vec<PvEntry>,
    pub error: Option<ErrorBody>,
}

impl PositionReport {
    pub fn failed(fen: String, error: &AnalysisError) -> Self {
        Self {
            status: Status::Error,
            fen,
            eval_cp: None,
            best_move: None,
            multipv: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use std::time::Duration;

    fn ply(n: usize, delta: Option<i32>) -> PlyReport {
        PlyReport {
            ply: n,
            played_uci: "e2e4".to_string(),
            played_san: "e4".to_string(),
            fen: String::new(),
            eval_cp: Some(0),
            delta_cp: delta,
            multipv: Vec::new(),
        }
    }

    #[test]
    fn key_moments_rank_by_absolute_swing() {
        let plies = vec![
            ply(1, None),
            ply(2, Some(40)),
            ply(3, Some(-300)),
            ply(4, Some(120)),
            ply(5, Some(-120)),
            ply(6, Some(5)),
        ];
        let moments: Vec<usize> = key_moments(&plies, 3).iter().map(|p| p.ply).collect();
        assert_eq!(moments, vec![3, 4, 5]);
    }

    #[test]
    fn envelope_serializes_with_lowercase_status() {
        let err = AnalysisError::Engine(EngineError::Timeout(Duration::from_secs(10)));
        let value = serde_json::to_value(GameReport::partial(vec![ply(1, None)], 5, &err)).unwrap();
        assert_eq!(value["status"], "partial");
        assert_eq!(value["legal"], true);
        assert_eq!(value["error"]["code"], "ENGINE_TIMEOUT");
        assert_eq!(value["per_ply"].as_array().unwrap().len(), 1);

        let value = serde_json::to_value(GameReport::complete(Vec::new(), 5)).unwrap();
        assert_eq!(value["status"], "ok");
        assert!(value["error"].is_null());
    }
}
