// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default bind address; the container publishes the service on all interfaces
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;
/// Maximum accepted request body (1 MiB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Engine binary, looked up on PATH
pub const DEFAULT_ENGINE_PATH: &str = "stockfish";
/// Distribution packages install the engine here, outside the default PATH
pub const DEFAULT_ENGINE_SEARCH_PATH: &str = "/usr/games";
pub const DEFAULT_POOL_SIZE: usize = 2;
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 5_000;
/// Extra time allowed on top of the search's movetime before giving up
pub const DEFAULT_RESPONSE_GRACE_MS: u64 = 10_000;
pub const DEFAULT_CHECKOUT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_QUIT_TIMEOUT_MS: u64 = 1_000;

pub const DEFAULT_DEPTH: u32 = 12;
pub const DEFAULT_MULTIPV: u32 = 2;
/// Time per ply in seconds
pub const DEFAULT_TIME_SEC: f64 = 0.05;
pub const MAX_DEPTH: u32 = 30;
/// Hard cap on reported lines per position
pub const MAX_MULTIPV: u32 = 3;
pub const MAX_TIME_SEC: f64 = 5.0;
pub const MAX_PLIES: usize = 600;
pub const DEFAULT_KEY_MOMENTS: usize = 5;

/// Centipawn value reported for a forced mate
pub const MATE_SCORE_CP: i32 = 100_000;

pub const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_HOST: &str = "ANALYZER_HOST";
pub const ENV_PORT: &str = "ANALYZER_PORT";
pub const ENV_ENGINE_PATH: &str = "ANALYZER_ENGINE_PATH";
pub const ENV_POOL_SIZE: &str = "ANALYZER_POOL_SIZE";
pub const ENV_LOG_FORMAT: &str = "ANALYZER_LOG_FORMAT";
