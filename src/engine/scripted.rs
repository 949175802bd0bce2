// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process engine doubles for unit tests.
//!
//! [`ScriptedEngine`] answers searches from the position itself: candidate
//! moves are the first legal moves, scored by material balance for the side
//! to move. Failures and delays are injected through [`Script`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::chess::{Board, Role, Square};
use crate::engine::uci::{InfoLine, Score, SearchOutcome, SearchRequest};
use crate::errors::{EngineError, EngineResult};
use crate::traits::{ChessEngine, EngineLauncher};

/// Behaviour shared by every engine a [`ScriptedLauncher`] creates.
#[derive(Debug, Default)]
pub struct Script {
    /// Fixed scores keyed by FEN, overriding the material count.
    pub scores: HashMap<String, Score>,
    /// Zero-based index of the analyse call (across all engines) that fails.
    pub fail_on_call: Option<usize>,
    pub failure: Option<EngineError>,
    /// Error returned by `launch`.
    pub launch_failure: Option<EngineError>,
    pub ping_failure: Option<EngineError>,
    /// Sleep inside every analyse call.
    pub delay: Option<Duration>,
    /// Reported best move for every search, legal or not.
    pub forced_best_move: Option<String>,
}

/// Counters a test can inspect after the fact.
#[derive(Debug, Default)]
pub struct ScriptLog {
    pub launched: AtomicUsize,
    pub analyse_calls: AtomicUsize,
    pub new_games: AtomicUsize,
    pub quits: AtomicUsize,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptLog {
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

pub struct ScriptedEngine {
    script: Arc<Script>,
    log: Arc<ScriptLog>,
    alive: bool,
}

#[async_trait]
impl ChessEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "ScriptedFish"
    }

    async fn analyse(&mut self, request: &SearchRequest) -> EngineResult<SearchOutcome> {
        let call = self.log.analyse_calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_on_call == Some(call) {
            self.alive = false;
            return Err(self
                .script
                .failure
                .clone()
                .unwrap_or_else(|| EngineError::Protocol("scripted failure".to_string())));
        }

        let board = Board::from_fen(&request.fen)
            .map_err(|e| EngineError::Protocol(format!("scripted engine got bad fen: {e}")))?;
        let score = self
            .script
            .scores
            .get(&request.fen)
            .copied()
            .unwrap_or_else(|| Score::Cp(material_balance(&board)));

        let moves = board.legal_moves();
        let lines: Vec<InfoLine> = moves
            .iter()
            .take(request.multipv.max(1) as usize)
            .enumerate()
            .map(|(i, mv)| InfoLine {
                depth: request.limit.depth,
                multipv: i as u32 + 1,
                score: Some(match score {
                    Score::Cp(cp) => Score::Cp(cp - 10 * i as i32),
                    mate => mate,
                }),
                pv: vec![mv.to_uci()],
                ..InfoLine::default()
            })
            .collect();

        let best_move = self
            .script
            .forced_best_move
            .clone()
            .or_else(|| moves.first().map(|mv| mv.to_uci()));
        Ok(SearchOutcome { lines, best_move })
    }

    async fn new_game(&mut self) -> EngineResult<()> {
        self.log.new_games.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&mut self) -> EngineResult<()> {
        match &self.script.ping_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn is_alive(&mut self) -> bool {
        self.alive
    }

    async fn quit(&mut self) {
        self.alive = false;
        self.log.quits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Material for the side to move, in centipawns.
fn material_balance(board: &Board) -> i32 {
    Square::all()
        .filter_map(|sq| board.piece_at(sq))
        .map(|piece| {
            let value = match piece.role {
                Role::Pawn => 100,
                Role::Knight | Role::Bishop => 300,
                Role::Rook => 500,
                Role::Queen => 900,
                Role::King => 0,
            };
            if piece.color == board.turn() {
                value
            } else {
                -value
            }
        })
        .sum()
}

pub struct ScriptedLauncher {
    script: Arc<Script>,
    log: Arc<ScriptLog>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::new(ScriptLog::default()),
        }
    }

    pub fn log(&self) -> Arc<ScriptLog> {
        self.log.clone()
    }
}

impl Default for ScriptedLauncher {
    fn default() -> Self {
        Self::new(Script::default())
    }
}

#[async_trait]
impl EngineLauncher for ScriptedLauncher {
    async fn launch(&self) -> EngineResult<Box<dyn ChessEngine>> {
        if let Some(error) = &self.script.launch_failure {
            return Err(error.clone());
        }
        self.log.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            script: self.script.clone(),
            log: self.log.clone(),
            alive: true,
        }))
    }
}
