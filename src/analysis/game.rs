// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Instant;

use serde_json::json;
use tracing::Instrument;

use crate::analysis::position::{convert_lines, terminal_eval};
use crate::analysis::report::{GameReport, PlyReport};
use crate::analysis::request::{AnalyzePgnRequest, SearchSettings};
use crate::chess::{parse_san, read_game, to_san, Board, Move, SanError};
use crate::config::AnalysisConfig;
use crate::engine::{EnginePool, SearchRequest};
use crate::errors::{AnalysisError, EngineError, IllegalMoveDetail};
use crate::observability::messages::analysis::{
    AnalysisCompleted, AnalysisInterrupted, AnalysisStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::ChessEngine;

/// A mainline move that was checked against the rules.
#[derive(Debug, Clone)]
pub struct ReplayedPly {
    pub ply: usize,
    pub played: Move,
    pub san: String,
    /// Position after the move.
    pub after: Board,
}

/// Replay the first game in `pgn` from its starting position.
///
/// The starting position is `initial_fen` if given, else the game's `FEN`
/// tag, else the standard position. Every move is checked before any
/// engine work starts, so an illegal game never costs a search.
pub fn replay(
    pgn: &str,
    initial_fen: Option<&str>,
    max_plies: usize,
) -> Result<Vec<ReplayedPly>, AnalysisError> {
    let game = read_game(pgn)?;
    if game.moves.len() > max_plies {
        return Err(AnalysisError::InvalidRequest(format!(
            "game has {} plies, at most {} can be analysed",
            game.moves.len(),
            max_plies
        )));
    }

    let start = initial_fen
        .map(str::trim)
        .filter(|fen| !fen.is_empty())
        .or_else(|| game.starting_fen());
    let mut board = match start {
        Some(fen) => Board::from_fen(fen)?,
        None => Board::standard(),
    };

    let mut plies = Vec::with_capacity(game.moves.len());
    for (index, token) in game.moves.iter().enumerate() {
        let ply = index + 1;
        let played = parse_san(&board, token).map_err(|err| match err {
            SanError::Syntax(_) => AnalysisError::InvalidPgn {
                message: format!("'{}' at ply {} is not a move", token, ply),
                details: json!({ "ply": ply, "token": token }),
            },
            SanError::Illegal { pseudo_legal, .. } => {
                AnalysisError::IllegalMove(IllegalMoveDetail {
                    ply,
                    san: token.clone(),
                    uci: pseudo_legal.map(|mv| mv.to_uci()),
                    fen_before: board.to_fen(),
                })
            }
            SanError::Ambiguous(_) => AnalysisError::IllegalMove(IllegalMoveDetail {
                ply,
                san: token.clone(),
                uci: None,
                fen_before: board.to_fen(),
            }),
        })?;

        let san = to_san(&board, &played);
        board = board.play(&played);
        plies.push(ReplayedPly {
            ply,
            played,
            san,
            after: board.clone(),
        });
    }
    Ok(plies)
}

/// Analyse every ply of a replayed game with one engine.
///
/// Returns the plies analysed so far together with the error that stopped
/// the run, if any.
pub async fn analyse_plies(
    engine: &mut dyn ChessEngine,
    plies: &[ReplayedPly],
    settings: &SearchSettings,
) -> (Vec<PlyReport>, Option<EngineError>) {
    let mut reports = Vec::with_capacity(plies.len());
    let mut previous_eval: Option<i32> = None;

    for ply in plies {
        let (eval_cp, multipv) = match ply.after.outcome() {
            Some(outcome) => (Some(terminal_eval(outcome)), Vec::new()),
            None => {
                let request = SearchRequest {
                    fen: ply.after.to_fen(),
                    limit: settings.limit(),
                    multipv: settings.multipv,
                };
                let lines = match engine.analyse(&request).await {
                    Ok(outcome) => convert_lines(&ply.after, &outcome),
                    Err(err) => Err(err),
                };
                match lines {
                    Ok(lines) => lines,
                    Err(err) => return (reports, Some(err)),
                }
            }
        };

        let delta_cp = match (previous_eval, eval_cp) {
            (Some(previous), Some(current)) => Some(current.saturating_sub(previous)),
            _ => None,
        };
        if eval_cp.is_some() {
            previous_eval = eval_cp;
        }

        reports.push(PlyReport {
            ply: ply.ply,
            played_uci: ply.played.to_uci(),
            played_san: ply.san.clone(),
            fen: ply.after.to_fen(),
            eval_cp,
            delta_cp,
            multipv,
        });
    }
    (reports, None)
}

/// Full `/analyze_pgn` flow: validate, replay, analyse, summarise.
///
/// Request and game errors come back as `Err`. An engine failure after at
/// least one analysed ply comes back as a partial report instead.
pub async fn analyze_game(
    pool: &EnginePool,
    config: &AnalysisConfig,
    request: &AnalyzePgnRequest,
) -> Result<GameReport, AnalysisError> {
    let settings = SearchSettings::resolve(request.depth, request.multipv, request.time_sec, config)?;
    let plies = replay(&request.pgn, request.initial_fen.as_deref(), config.max_plies)?;
    if plies.is_empty() {
        return Ok(GameReport::complete(Vec::new(), config.key_moments));
    }

    let start = AnalysisStarted {
        kind: "game",
        positions: plies.len(),
        depth: settings.depth,
        multipv: settings.multipv,
        movetime_ms: settings.movetime_ms(),
    };
    let span = start.span("game_analysis");
    span.in_scope(|| start.log());

    analyse_replayed(pool, config, &plies, &settings)
        .instrument(span)
        .await
}

async fn analyse_replayed(
    pool: &EnginePool,
    config: &AnalysisConfig,
    plies: &[ReplayedPly],
    settings: &SearchSettings,
) -> Result<GameReport, AnalysisError> {
    let started = Instant::now();

    let mut engine = pool.checkout().await?;
    engine.new_game().await?;
    let (per_ply, failure) = analyse_plies(&mut engine, plies, settings).await;

    match failure {
        None => {
            AnalysisCompleted {
                kind: "game",
                positions: per_ply.len(),
                duration: started.elapsed(),
            }
            .log();
            Ok(GameReport::complete(per_ply, config.key_moments))
        }
        Some(error) if per_ply.is_empty() => Err(error.into()),
        Some(error) => {
            AnalysisInterrupted {
                analysed: per_ply.len(),
                total: plies.len(),
                error: &error,
            }
            .log();
            Ok(GameReport::partial(
                per_ply,
                config.key_moments,
                &AnalysisError::Engine(error),
            ))
        }
    }
}
