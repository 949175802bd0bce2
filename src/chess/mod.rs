// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chess rules needed to replay games and talk to a UCI engine.
//!
//! The engine only understands FEN positions and UCI move strings, while
//! clients send PGN with SAN moves and expect SAN back. This module bridges
//! the two:
//!
//! * `types` - colors, roles, squares and moves (with UCI notation)
//! * `board` - position state, legal move generation and move application
//! * `fen` - FEN parsing and rendering
//! * `san` - SAN rendering and resolution
//! * `pgn` - mainline reader for the first game of a PGN document
//!
//! Standard chess only; Chess960 castling is not supported.

pub mod board;
pub mod fen;
pub mod pgn;
pub mod san;
pub mod types;

pub use board::{Board, CastlingRights, Outcome};
pub use fen::{FenError, STARTING_FEN};
pub use pgn::{read_game, PgnError, PgnGame};
pub use san::{parse_san, to_san, SanError};
pub use types::{Color, Move, Piece, Role, Square, UciMoveError};
