// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Forsyth-Edwards Notation.

use thiserror::Error;

use crate::chess::board::{Board, CastlingRights};
use crate::chess::types::{Color, Piece, Role, Square};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FenError {
    #[error("FEN must have 4 to 6 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid piece placement: {0}")]
    Placement(String),

    #[error("invalid side to move: '{0}'")]
    Turn(String),

    #[error("invalid castling field: '{0}'")]
    Castling(String),

    #[error("invalid en passant square: '{0}'")]
    EnPassant(String),

    #[error("invalid move counter: '{0}'")]
    Counter(String),

    #[error("illegal position: {0}")]
    IllegalPosition(String),
}

impl Board {
    /// Parse and validate a FEN string. The halfmove and fullmove fields may be omitted.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut board = Board::empty();
        parse_placement(&mut board, fields[0])?;

        board.turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::Turn(other.to_string())),
        };

        board.castling = parse_castling(fields[2])?;

        board.ep_square = match fields[3] {
            "-" => None,
            sq => {
                let square: Square = sq
                    .parse()
                    .map_err(|_| FenError::EnPassant(sq.to_string()))?;
                let expected_rank = if board.turn == Color::White { 5 } else { 2 };
                if square.rank() != expected_rank {
                    return Err(FenError::EnPassant(sq.to_string()));
                }
                Some(square)
            }
        };

        if let Some(halfmove) = fields.get(4) {
            board.halfmove_clock = halfmove
                .parse()
                .map_err(|_| FenError::Counter(halfmove.to_string()))?;
        }
        if let Some(fullmove) = fields.get(5) {
            let n: u32 = fullmove
                .parse()
                .map_err(|_| FenError::Counter(fullmove.to_string()))?;
            board.fullmove_number = n.max(1);
        }

        validate(&board)?;
        board.castling = sanitize_castling(&board);
        Ok(board)
    }

    /// Render as FEN. The en passant square is only written when a legal
    /// en passant capture exists, so equal positions render identically.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        let castling = self.castling;
        if castling.is_empty() {
            out.push('-');
        } else {
            if castling.white_king_side {
                out.push('K');
            }
            if castling.white_queen_side {
                out.push('Q');
            }
            if castling.black_king_side {
                out.push('k');
            }
            if castling.black_queen_side {
                out.push('q');
            }
        }

        out.push(' ');
        match self.ep_square {
            Some(ep) if self.has_legal_en_passant() => out.push_str(&ep.to_string()),
            _ => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::Placement(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    for (i, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file: u8 = 0;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(FenError::Placement(format!("bad empty count '{c}'")));
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_fen_char(c)
                    .ok_or_else(|| FenError::Placement(format!("unknown piece '{c}'")))?;
                if file >= 8 {
                    return Err(FenError::Placement(format!("rank {} too long", rank + 1)));
                }
                board.put(Square::new(file, rank), piece);
                file += 1;
            }
            if file > 8 {
                return Err(FenError::Placement(format!("rank {} too long", rank + 1)));
            }
        }
        if file != 8 {
            return Err(FenError::Placement(format!("rank {} too short", rank + 1)));
        }
    }
    Ok(())
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::default();
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.white_king_side = true,
            'Q' => rights.white_queen_side = true,
            'k' => rights.black_king_side = true,
            'q' => rights.black_queen_side = true,
            _ => return Err(FenError::Castling(field.to_string())),
        }
    }
    Ok(rights)
}

fn validate(board: &Board) -> Result<(), FenError> {
    for color in [Color::White, Color::Black] {
        let kings = Square::all()
            .filter(|sq| board.piece_at(*sq) == Some(Piece::new(color, Role::King)))
            .count();
        if kings != 1 {
            return Err(FenError::IllegalPosition(format!(
                "{:?} must have exactly one king, found {}",
                color, kings
            )));
        }
    }

    let pawn_on_back_rank = Square::all().any(|sq| {
        (sq.rank() == 0 || sq.rank() == 7)
            && matches!(board.piece_at(sq), Some(p) if p.role == Role::Pawn)
    });
    if pawn_on_back_rank {
        return Err(FenError::IllegalPosition(
            "pawns cannot stand on the first or last rank".to_string(),
        ));
    }

    let waiting = board.turn.opposite();
    if let Some(king) = board.king_square(waiting) {
        if board.is_attacked(king, board.turn) {
            return Err(FenError::IllegalPosition(
                "side not to move is in check".to_string(),
            ));
        }
    }
    Ok(())
}

/// Drop castling rights whose king or rook is not on its home square.
fn sanitize_castling(board: &Board) -> CastlingRights {
    let mut rights = board.castling;
    let home = |color: Color, file: u8, role: Role| {
        board.piece_at(Square::new(file, color.back_rank())) == Some(Piece::new(color, role))
    };
    if !home(Color::White, 4, Role::King) {
        rights.white_king_side = false;
        rights.white_queen_side = false;
    }
    if !home(Color::Black, 4, Role::King) {
        rights.black_king_side = false;
        rights.black_queen_side = false;
    }
    if !home(Color::White, 7, Role::Rook) {
        rights.white_king_side = false;
    }
    if !home(Color::White, 0, Role::Rook) {
        rights.white_queen_side = false;
    }
    if !home(Color::Black, 7, Role::Rook) {
        rights.black_king_side = false;
    }
    if !home(Color::Black, 0, Role::Rook) {
        rights.black_queen_side = false;
    }
    rights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_round_trips() {
        let board = Board::from_fen(STARTING_FEN).unwrap();
        assert_eq!(board, Board::standard());
        assert_eq!(board.to_fen(), STARTING_FEN);
    }

    #[test]
    fn counters_are_optional() {
        let board = Board::from_fen("8/8/8/8/8/8/8/K6k w - -").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/K6k w - - 0 1");
    }

    #[test]
    fn en_passant_square_only_rendered_when_capturable() {
        // After 1. e4 no black pawn can take on e3.
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        assert_eq!(board.ep_square().unwrap().to_string(), "e3");
        assert!(board.to_fen().contains(" b KQkq - 0 1"));

        let capturable =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        assert!(capturable.to_fen().contains(" w KQkq f6 0 3"));
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1"),
            Err(FenError::Placement(_))
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::Turn(_))
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1"),
            Err(FenError::Castling(_))
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1"),
            Err(FenError::EnPassant(_))
        ));
        assert!(matches!(Board::from_fen("hello"), Err(FenError::FieldCount(1))));
    }

    #[test]
    fn rejects_illegal_positions() {
        assert!(matches!(
            Board::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1"),
            Err(FenError::IllegalPosition(_))
        ));
        // Black king in check with White to move.
        assert!(matches!(
            Board::from_fen("k7/8/8/8/8/8/8/R5K1 w - - 0 1"),
            Err(FenError::IllegalPosition(_))
        ));
    }

    #[test]
    fn stale_castling_rights_are_dropped() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert!(board.castling().is_empty());
    }
}
