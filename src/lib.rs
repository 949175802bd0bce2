// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod analysis;      // game + position analysis
pub mod chess;         // rules, FEN, SAN, PGN
pub mod config;        // YAML config + overrides
pub mod engine;        // UCI adapter + pool
pub mod errors;        // error handling
pub mod http;          // axum routes
pub mod observability;
pub mod traits;        // engine seams
