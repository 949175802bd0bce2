// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde::Deserialize;

use crate::config::AnalysisConfig;
use crate::engine::SearchLimit;
use crate::errors::AnalysisError;

/// Body of `POST /analyze_pgn`. Omitted limits fall back to configured defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyzePgnRequest {
    pub pgn: String,
    #[serde(default)]
    pub initial_fen: Option<String>,
    #[serde(default)]
    pub depth: Option<i64>,
    #[serde(default)]
    pub multipv: Option<i64>,
    #[serde(default)]
    pub time_sec: Option<f64>,
}

/// Body of `POST /analyze_position`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyzePositionRequest {
    pub fen: String,
    #[serde(default)]
    pub depth: Option<i64>,
    #[serde(default)]
    pub multipv: Option<i64>,
    #[serde(default)]
    pub time_sec: Option<f64>,
}

/// Search limits after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub depth: u32,
    pub multipv: u32,
    /// `None` means depth-only search.
    pub movetime: Option<Duration>,
}

impl SearchSettings {
    /// Resolve requested limits against the configured defaults and maxima.
    ///
    /// Depth and MultiPV are clamped into range rather than rejected. A
    /// non-positive `time_sec` disables the time limit; a non-finite one is
    /// an invalid request.
    pub fn resolve(
        depth: Option<i64>,
        multipv: Option<i64>,
        time_sec: Option<f64>,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let depth = depth
            .unwrap_or(i64::from(config.default_depth))
            .clamp(1, i64::from(config.max_depth.max(1))) as u32;
        let multipv = multipv
            .unwrap_or(i64::from(config.default_multipv))
            .clamp(1, i64::from(config.max_multipv.max(1))) as u32;

        let time_sec = time_sec.unwrap_or(config.default_time_sec);
        if !time_sec.is_finite() {
            return Err(AnalysisError::InvalidRequest(
                "time_sec must be a finite number".to_string(),
            ));
        }
        let movetime = if time_sec <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(time_sec.min(config.max_time_sec)))
        };

        Ok(Self {
            depth,
            multipv,
            movetime,
        })
    }

    pub fn limit(&self) -> SearchLimit {
        SearchLimit {
            depth: Some(self.depth),
            movetime: self.movetime,
            nodes: None,
        }
    }

    pub fn movetime_ms(&self) -> Option<u64> {
        self.movetime.map(|t| t.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let settings = SearchSettings::resolve(None, None, None, &AnalysisConfig::default()).unwrap();
        assert_eq!(settings.depth, 12);
        assert_eq!(settings.multipv, 2);
        assert_eq!(settings.movetime, Some(Duration::from_millis(50)));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = AnalysisConfig::default();
        let settings = SearchSettings::resolve(Some(500), Some(9), Some(60.0), &config).unwrap();
        assert_eq!(settings.depth, config.max_depth);
        assert_eq!(settings.multipv, 3);
        assert_eq!(settings.movetime, Some(Duration::from_secs(5)));

        let settings = SearchSettings::resolve(Some(-4), Some(0), None, &config).unwrap();
        assert_eq!(settings.depth, 1);
        assert_eq!(settings.multipv, 1);
    }

    #[test]
    fn non_positive_time_means_depth_only() {
        let config = AnalysisConfig::default();
        let settings = SearchSettings::resolve(Some(8), None, Some(0.0), &config).unwrap();
        assert_eq!(settings.movetime, None);
        assert_eq!(
            settings.limit(),
            SearchLimit {
                depth: Some(8),
                movetime: None,
                nodes: None
            }
        );
    }

    #[test]
    fn non_finite_time_is_rejected() {
        let err = SearchSettings::resolve(None, None, Some(f64::NAN), &AnalysisConfig::default())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn request_accepts_minimal_body() {
        let request: AnalyzePgnRequest = serde_json::from_str(r#"{"pgn": "1. e4 e5"}"#).unwrap();
        assert_eq!(request.pgn, "1. e4 e5");
        assert!(request.initial_fen.is_none());
        assert!(request.depth.is_none());
    }
}
