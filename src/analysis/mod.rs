// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Game and position analysis on top of the engine pool.
//!
//! * `request` - request bodies and limit resolution
//! * `game` - PGN replay and per-ply analysis
//! * `position` - single-position evaluation
//! * `report` - response envelopes and key moment selection

pub mod game;
pub mod position;
pub mod report;
pub mod request;

pub use game::{analyse_plies, analyze_game, replay, ReplayedPly};
pub use position::analyze_position;
pub use report::{
    key_moments, BestMoveReport, ErrorBody, GameReport, PlyReport, PositionReport, PvEntry, Status,
};
pub use request::{AnalyzePgnRequest, AnalyzePositionRequest, SearchSettings};
