// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Instant;

use tracing::Instrument;

use crate::analysis::report::{BestMoveReport, PositionReport, PvEntry, Status};
use crate::analysis::request::{AnalyzePositionRequest, SearchSettings};
use crate::chess::{to_san, Board, Color, Move, Outcome};
use crate::config::consts::MATE_SCORE_CP;
use crate::config::AnalysisConfig;
use crate::engine::{EnginePool, SearchOutcome, SearchRequest};
use crate::errors::{AnalysisError, EngineError};
use crate::observability::messages::analysis::{AnalysisCompleted, AnalysisStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::ChessEngine;

/// Evaluate one position: best move, score and candidate lines.
pub async fn analyze_position(
    pool: &EnginePool,
    config: &AnalysisConfig,
    request: &AnalyzePositionRequest,
) -> Result<PositionReport, AnalysisError> {
    let settings = SearchSettings::resolve(request.depth, request.multipv, request.time_sec, config)?;
    let board = Board::from_fen(request.fen.trim())?;
    let fen = board.to_fen();

    if let Some(outcome) = board.outcome() {
        return Ok(PositionReport {
            status: Status::Ok,
            fen,
            eval_cp: Some(terminal_eval(outcome)),
            best_move: None,
            multipv: Vec::new(),
            error: None,
        });
    }

    let start = AnalysisStarted {
        kind: "position",
        positions: 1,
        depth: settings.depth,
        multipv: settings.multipv,
        movetime_ms: settings.movetime_ms(),
    };
    let span = start.span("position_analysis");
    span.in_scope(|| start.log());

    search_position(pool, board, fen, &settings)
        .instrument(span)
        .await
}

async fn search_position(
    pool: &EnginePool,
    board: Board,
    fen: String,
    settings: &SearchSettings,
) -> Result<PositionReport, AnalysisError> {
    let started = Instant::now();

    let mut engine = pool.checkout().await?;
    let search = SearchRequest {
        fen: fen.clone(),
        limit: settings.limit(),
        multipv: settings.multipv,
    };
    let outcome = engine.analyse(&search).await?;
    let (eval_cp, multipv) = convert_lines(&board, &outcome)?;
    let best_move = match &outcome.best_move {
        Some(uci) => {
            let mv = legal_engine_move(&board, uci)?;
            Some(BestMoveReport {
                uci: mv.to_uci(),
                san: to_san(&board, &mv),
            })
        }
        None => None,
    };

    AnalysisCompleted {
        kind: "position",
        positions: 1,
        duration: started.elapsed(),
    }
    .log();

    Ok(PositionReport {
        status: Status::Ok,
        fen,
        eval_cp,
        best_move,
        multipv,
        error: None,
    })
}

/// White-relative score of a finished game.
pub(crate) fn terminal_eval(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Checkmate {
            winner: Color::White,
        } => MATE_SCORE_CP,
        Outcome::Checkmate {
            winner: Color::Black,
        } => -MATE_SCORE_CP,
        Outcome::Stalemate => 0,
    }
}

/// Resolve a move the engine suggested for `board`. Engines only suggest
/// legal moves, so anything else means the exchange went wrong.
pub(crate) fn legal_engine_move(board: &Board, uci: &str) -> Result<Move, EngineError> {
    Move::from_uci(uci)
        .ok()
        .and_then(|mv| board.find_legal(&mv))
        .ok_or_else(|| {
            EngineError::Protocol(format!(
                "engine suggested '{}', which is not legal in {}",
                uci,
                board.to_fen()
            ))
        })
}

/// Turn engine lines for `board` into White-relative candidates with SAN.
/// Returns the rank-1 evaluation alongside.
pub(crate) fn convert_lines(
    board: &Board,
    outcome: &SearchOutcome,
) -> Result<(Option<i32>, Vec<PvEntry>), EngineError> {
    let sign = match board.turn() {
        Color::White => 1,
        Color::Black => -1,
    };

    let mut main_eval = None;
    let mut entries = Vec::with_capacity(outcome.lines.len());
    for line in &outcome.lines {
        let Some(first) = line.pv.first() else {
            continue;
        };
        let mv = legal_engine_move(board, first)?;
        let eval_cp = line.score.map(|score| score.to_centipawns().saturating_mul(sign));
        if line.multipv == 1 {
            main_eval = eval_cp;
        }
        entries.push(PvEntry {
            rank: line.multipv,
            uci: mv.to_uci(),
            san: to_san(board, &mv),
            eval_cp,
        });
    }
    entries.sort_by_key(|entry| entry.rank);
    Ok((main_eval, entries))
}
