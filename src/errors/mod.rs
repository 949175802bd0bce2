// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod analysis;
mod config;
mod engine;

pub use analysis::{AnalysisError, IllegalMoveDetail};
pub use config::ConfigError;
pub use engine::{EngineError, EngineResult};
