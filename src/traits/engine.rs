// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::uci::{SearchOutcome, SearchRequest};
use crate::errors::EngineResult;

/// A chess engine session that can be asked to analyse positions.
///
/// Implementations own one engine exclusively. Callers must not share a
/// session between concurrent requests; the pool hands each request its
/// own session instead.
#[async_trait]
pub trait ChessEngine: Send {
    /// Engine identification, as reported by `id name`.
    fn name(&self) -> &str;

    /// Search one position and return the final line per MultiPV rank.
    async fn analyse(&mut self, request: &SearchRequest) -> EngineResult<SearchOutcome>;

    /// Reset search state before an unrelated game.
    async fn new_game(&mut self) -> EngineResult<()>;

    /// Round-trip `isready` to prove the engine is responsive.
    async fn ping(&mut self) -> EngineResult<()>;

    /// Whether the session can still be used. Cheap; does not talk to the engine.
    fn is_alive(&mut self) -> bool;

    /// Stop the engine. The session is unusable afterwards.
    async fn quit(&mut self);
}

/// Creates fresh engine sessions for the pool.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self) -> EngineResult<Box<dyn ChessEngine>>;
}
