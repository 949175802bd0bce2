// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod pool;
pub mod process;
pub mod uci;
#[cfg(test)]
pub mod scripted;

pub use pool::{EnginePool, PoolStats, PooledEngine};
pub use process::{UciEngine, UciLauncher};
pub use uci::{InfoLine, Score, SearchLimit, SearchOutcome, SearchRequest};
