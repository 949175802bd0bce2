// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Standard Algebraic Notation: rendering legal moves and resolving SAN tokens.

use thiserror::Error;

use crate::chess::board::Board;
use crate::chess::types::{Move, Role, Square};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanError {
    /// The token is not SAN at all.
    #[error("not a SAN move: '{0}'")]
    Syntax(String),

    /// Well-formed SAN that names no legal move. `pseudo_legal` carries the
    /// move when the SAN matches one that only fails the king-safety rule.
    #[error("illegal move: '{san}'")]
    Illegal {
        san: String,
        pseudo_legal: Option<Move>,
    },

    #[error("ambiguous move: '{0}'")]
    Ambiguous(String),
}

/// Parsed SAN, before it is matched against a position.
#[derive(Debug, Clone, PartialEq)]
enum SanToken {
    Castle { king_side: bool },
    Normal {
        role: Role,
        from_file: Option<u8>,
        from_rank: Option<u8>,
        capture: bool,
        to: Square,
        promotion: Option<Role>,
    },
}

/// Render a legal move in SAN, including the check or mate suffix.
pub fn to_san(board: &Board, mv: &Move) -> String {
    let mut san = san_body(board, mv);
    let after = board.play(mv);
    if after.in_check() {
        if after.legal_moves().is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }
    san
}

fn san_body(board: &Board, mv: &Move) -> String {
    if board.is_castling(mv) {
        return if mv.to.file() == 6 {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let role = match board.piece_at(mv.from) {
        Some(piece) => piece.role,
        None => return mv.to_uci(),
    };
    let capture = board.is_capture(mv);
    let mut san = String::with_capacity(8);

    if role == Role::Pawn {
        if capture {
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(promotion) = mv.promotion {
            san.push('=');
            san.push(promotion.upper_char());
        }
        return san;
    }

    san.push(role.upper_char());

    let rivals: Vec<Move> = board
        .legal_moves()
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_at(other.from).map(|p| p.role) == Some(role)
        })
        .collect();
    if !rivals.is_empty() {
        let shares_file = rivals.iter().any(|o| o.from.file() == mv.from.file());
        let shares_rank = rivals.iter().any(|o| o.from.rank() == mv.from.rank());
        if !shares_file {
            san.push(mv.from.file_char());
        } else if !shares_rank {
            san.push(mv.from.rank_char());
        } else {
            san.push(mv.from.file_char());
            san.push(mv.from.rank_char());
        }
    }

    if capture {
        san.push('x');
    }
    san.push_str(&mv.to.to_string());
    san
}

/// Resolve a SAN token against a position.
pub fn parse_san(board: &Board, text: &str) -> Result<Move, SanError> {
    let token = tokenize(text)?;

    let matches = |candidates: &[Move]| -> Vec<Move> {
        candidates
            .iter()
            .copied()
            .filter(|mv| token_matches(board, &token, mv))
            .collect()
    };

    let legal = matches(&board.legal_moves());
    match legal.len() {
        1 => Ok(legal[0]),
        0 => {
            let pseudo = matches(&board.pseudo_legal_moves());
            Err(SanError::Illegal {
                san: text.to_string(),
                pseudo_legal: if pseudo.len() == 1 { Some(pseudo[0]) } else { None },
            })
        }
        _ => Err(SanError::Ambiguous(text.to_string())),
    }
}

fn token_matches(board: &Board, token: &SanToken, mv: &Move) -> bool {
    match token {
        SanToken::Castle { king_side } => {
            board.is_castling(mv) && (mv.to.file() == 6) == *king_side
        }
        SanToken::Normal {
            role,
            from_file,
            from_rank,
            capture,
            to,
            promotion,
        } => {
            let piece_role = match board.piece_at(mv.from) {
                Some(p) => p.role,
                None => return false,
            };
            if piece_role != *role || mv.to != *to || mv.promotion != *promotion {
                return false;
            }
            if *role == Role::King && board.is_castling(mv) {
                return false;
            }
            if from_file.is_some_and(|f| f != mv.from.file()) {
                return false;
            }
            if from_rank.is_some_and(|r| r != mv.from.rank()) {
                return false;
            }
            // A pawn capture must name its file; a pawn push must not capture.
            if *role == Role::Pawn && *capture != board.is_capture(mv) {
                return false;
            }
            true
        }
    }
}

fn tokenize(text: &str) -> Result<SanToken, SanError> {
    let syntax = || SanError::Syntax(text.to_string());

    let trimmed = text.trim_end_matches(['+', '#', '!', '?']);
    match trimmed {
        "O-O" | "0-0" => return Ok(SanToken::Castle { king_side: true }),
        "O-O-O" | "0-0-0" => return Ok(SanToken::Castle { king_side: false }),
        _ => {}
    }
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return Err(syntax());
    }

    let mut rest = trimmed;
    let role = match rest.chars().next().and_then(|c| {
        if c.is_ascii_uppercase() {
            Role::from_char(c)
        } else {
            None
        }
    }) {
        Some(Role::Pawn) => return Err(syntax()),
        Some(role) => {
            rest = &rest[1..];
            role
        }
        None => Role::Pawn,
    };

    let mut promotion = None;
    if role == Role::Pawn {
        if let Some(last) = rest.chars().last() {
            // The destination ends in a digit, so a trailing letter of
            // either case is the promotion piece.
            if last.is_ascii_alphabetic() {
                let promoted = Role::from_char(last).ok_or_else(syntax)?;
                if matches!(promoted, Role::Pawn | Role::King) {
                    return Err(syntax());
                }
                promotion = Some(promoted);
                rest = &rest[..rest.len() - 1];
                rest = rest.strip_suffix('=').unwrap_or(rest);
            }
        }
    }

    if rest.len() < 2 {
        return Err(syntax());
    }
    let (head, dest) = rest.split_at(rest.len() - 2);
    let to: Square = dest.parse().map_err(|_| syntax())?;

    let capture = head.ends_with('x');
    let head = head
        .strip_suffix('x')
        .or_else(|| head.strip_suffix('-'))
        .unwrap_or(head);

    let mut from_file = None;
    let mut from_rank = None;
    for c in head.chars() {
        match c {
            'a'..='h' if from_file.is_none() && from_rank.is_none() => {
                from_file = Some(c as u8 - b'a')
            }
            '1'..='8' if from_rank.is_none() => from_rank = Some(c as u8 - b'1'),
            _ => return Err(syntax()),
        }
    }

    if role == Role::Pawn {
        // Pawn captures name the origin file, pushes name nothing. Long
        // algebraic names the whole origin square either way.
        let long_form = from_file.is_some() && from_rank.is_some();
        if !long_form && (capture != from_file.is_some() || from_rank.is_some()) {
            return Err(syntax());
        }
    }

    Ok(SanToken::Normal {
        role,
        from_file,
        from_rank,
        capture,
        to,
        promotion,
    })
}
