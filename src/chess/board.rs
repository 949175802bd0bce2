// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Board representation, move generation and move application.
//!
//! The board is a plain 64-entry mailbox. Legal moves are produced by
//! generating pseudo-legal moves and discarding those that leave the mover's
//! king attacked. Positions stay small (one request replays a few hundred
//! plies at most), so clarity wins over bitboards here.

use crate::chess::types::{Color, Move, Piece, Role, Square};

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Castling availability for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_king_side: true,
            white_queen_side: true,
            black_king_side: true,
            black_queen_side: true,
        }
    }

    pub fn king_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_king_side,
            Color::Black => self.black_king_side,
        }
    }

    pub fn queen_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queen_side,
            Color::Black => self.black_queen_side,
        }
    }

    fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Drop any right tied to a rook corner that was moved from or captured on.
    fn touch(&mut self, square: Square) {
        match (square.file(), square.rank()) {
            (0, 0) => self.white_queen_side = false,
            (7, 0) => self.white_king_side = false,
            (0, 7) => self.black_queen_side = false,
            (7, 7) => self.black_king_side = false,
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.white_king_side
            || self.white_queen_side
            || self.black_king_side
            || self.black_queen_side)
    }
}

/// How a position ended, when it has no legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

/// A complete chess position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) squares: [Option<Piece>; 64],
    pub(crate) turn: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) ep_square: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    /// An empty board with White to move. Used as a starting point for FEN parsing.
    pub(crate) fn empty() -> Self {
        Self {
            squares: [None; 64],
            turn: Color::White,
            castling: CastlingRights::default(),
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard starting position.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        let back = [
            Role::Rook,
            Role::Knight,
            Role::Bishop,
            Role::Queen,
            Role::King,
            Role::Bishop,
            Role::Knight,
            Role::Rook,
        ];
        for (file, role) in back.iter().enumerate() {
            let file = file as u8;
            board.put(Square::new(file, 0), Piece::new(Color::White, *role));
            board.put(Square::new(file, 1), Piece::new(Color::White, Role::Pawn));
            board.put(Square::new(file, 6), Piece::new(Color::Black, Role::Pawn));
            board.put(Square::new(file, 7), Piece::new(Color::Black, *role));
        }
        board.castling = CastlingRights::all();
        board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    pub(crate) fn put(&mut self, square: Square, piece: Piece) {
        self.squares[square.index()] = Some(piece);
    }

    fn take(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.index()].take()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::all().find(|sq| {
            self.piece_at(*sq) == Some(Piece::new(color, Role::King))
        })
    }

    /// Whether any piece of `by` attacks `target`.
    pub fn is_attacked(&self, target: Square, by: Color) -> bool {
        // A pawn of `by` attacks `target` from one rank behind it, relative to its own direction.
        let pawn_rank = -by.forward();
        for df in [-1, 1] {
            if let Some(sq) = target.offset(df, pawn_rank) {
                if self.piece_at(sq) == Some(Piece::new(by, Role::Pawn)) {
                    return true;
                }
            }
        }

        for (df, dr) in KNIGHT_STEPS {
            if let Some(sq) = target.offset(df, dr) {
                if self.piece_at(sq) == Some(Piece::new(by, Role::Knight)) {
                    return true;
                }
            }
        }

        for (df, dr) in KING_STEPS {
            if let Some(sq) = target.offset(df, dr) {
                if self.piece_at(sq) == Some(Piece::new(by, Role::King)) {
                    return true;
                }
            }
        }

        self.slider_attacks(target, by, &ROOK_DIRECTIONS, Role::Rook)
            || self.slider_attacks(target, by, &BISHOP_DIRECTIONS, Role::Bishop)
    }

    fn slider_attacks(
        &self,
        target: Square,
        by: Color,
        directions: &[(i8, i8)],
        role: Role,
    ) -> bool {
        for &(df, dr) in directions {
            let mut current = target;
            while let Some(next) = current.offset(df, dr) {
                current = next;
                match self.piece_at(next) {
                    None => continue,
                    Some(piece) => {
                        if piece.color == by && (piece.role == role || piece.role == Role::Queen) {
                            return true;
                        }
                        break;
                    }
                }
            }
        }
        false
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        match self.king_square(self.turn) {
            Some(king) => self.is_attacked(king, self.turn.opposite()),
            None => false,
        }
    }

    /// All moves that obey piece movement rules, ignoring whether they expose the king.
    /// Castling moves are fully checked here since their transit rules are special.
    pub fn pseudo_legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        let us = self.turn;
        for from in Square::all() {
            let piece = match self.piece_at(from) {
                Some(p) if p.color == us => p,
                _ => continue,
            };
            match piece.role {
                Role::Pawn => self.pawn_moves(from, &mut moves),
                Role::Knight => self.step_moves(from, &KNIGHT_STEPS, &mut moves),
                Role::Bishop => self.slide_moves(from, &BISHOP_DIRECTIONS, &mut moves),
                Role::Rook => self.slide_moves(from, &ROOK_DIRECTIONS, &mut moves),
                Role::Queen => {
                    self.slide_moves(from, &ROOK_DIRECTIONS, &mut moves);
                    self.slide_moves(from, &BISHOP_DIRECTIONS, &mut moves);
                }
                Role::King => {
                    self.step_moves(from, &KING_STEPS, &mut moves);
                    self.castling_moves(from, &mut moves);
                }
            }
        }
        moves
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|mv| self.keeps_king_safe(mv))
            .collect()
    }

    pub fn is_legal(&self, mv: &Move) -> bool {
        self.pseudo_legal_moves().contains(mv) && self.keeps_king_safe(mv)
    }

    fn keeps_king_safe(&self, mv: &Move) -> bool {
        let after = self.play_unchecked(mv);
        match after.king_square(self.turn) {
            Some(king) => !after.is_attacked(king, after.turn),
            None => true,
        }
    }

    /// `None` while the side to move still has a legal move.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.legal_moves().is_empty() {
            return None;
        }
        if self.in_check() {
            Some(Outcome::Checkmate {
                winner: self.turn.opposite(),
            })
        } else {
            Some(Outcome::Stalemate)
        }
    }

    fn pawn_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.turn;
        let dir = us.forward();
        let start_rank = if us == Color::White { 1 } else { 6 };
        let promo_rank = if us == Color::White { 7 } else { 0 };

        if let Some(one) = from.offset(0, dir) {
            if self.piece_at(one).is_none() {
                push_pawn_move(from, one, promo_rank, moves);
                if from.rank() == start_rank {
                    if let Some(two) = from.offset(0, 2 * dir) {
                        if self.piece_at(two).is_none() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            if let Some(to) = from.offset(df, dir) {
                match self.piece_at(to) {
                    Some(target) if target.color != us => {
                        push_pawn_move(from, to, promo_rank, moves)
                    }
                    None if self.ep_square == Some(to) => moves.push(Move::new(from, to)),
                    _ => {}
                }
            }
        }
    }

    fn step_moves(&self, from: Square, steps: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in steps {
            if let Some(to) = from.offset(df, dr) {
                match self.piece_at(to) {
                    Some(target) if target.color == self.turn => {}
                    _ => moves.push(Move::new(from, to)),
                }
            }
        }
    }

    fn slide_moves(&self, from: Square, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                current = to;
                match self.piece_at(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(target) => {
                        if target.color != self.turn {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn castling_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.turn;
        let them = us.opposite();
        let rank = us.back_rank();
        if from != Square::new(4, rank) || self.is_attacked(from, them) {
            return;
        }

        let rook = Some(Piece::new(us, Role::Rook));

        if self.castling.king_side(us)
            && self.piece_at(Square::new(7, rank)) == rook
            && self.piece_at(Square::new(5, rank)).is_none()
            && self.piece_at(Square::new(6, rank)).is_none()
            && !self.is_attacked(Square::new(5, rank), them)
            && !self.is_attacked(Square::new(6, rank), them)
        {
            moves.push(Move::new(from, Square::new(6, rank)));
        }

        if self.castling.queen_side(us)
            && self.piece_at(Square::new(0, rank)) == rook
            && self.piece_at(Square::new(1, rank)).is_none()
            && self.piece_at(Square::new(2, rank)).is_none()
            && self.piece_at(Square::new(3, rank)).is_none()
            && !self.is_attacked(Square::new(3, rank), them)
            && !self.is_attacked(Square::new(2, rank), them)
        {
            moves.push(Move::new(from, Square::new(2, rank)));
        }
    }

    /// Whether `mv` is a capture, including en passant.
    pub fn is_capture(&self, mv: &Move) -> bool {
        self.piece_at(mv.to).is_some() || self.is_en_passant(mv)
    }

    fn is_en_passant(&self, mv: &Move) -> bool {
        matches!(self.piece_at(mv.from), Some(p) if p.role == Role::Pawn)
            && Some(mv.to) == self.ep_square
            && mv.from.file() != mv.to.file()
            && self.piece_at(mv.to).is_none()
    }

    pub fn is_castling(&self, mv: &Move) -> bool {
        matches!(self.piece_at(mv.from), Some(p) if p.role == Role::King)
            && (mv.from.file() as i8 - mv.to.file() as i8).abs() == 2
    }

    /// Play a legal move and return the resulting position.
    /// Callers must check legality first; see [`Board::is_legal`].
    pub fn play(&self, mv: &Move) -> Board {
        self.play_unchecked(mv)
    }

    pub(crate) fn play_unchecked(&self, mv: &Move) -> Board {
        let mut next = self.clone();
        let us = self.turn;

        let piece = match next.take(mv.from) {
            Some(p) => p,
            None => return next,
        };
        let en_passant = self.is_en_passant(mv);
        let castling = self.is_castling(mv);
        let captured = next.take(mv.to);

        if en_passant {
            next.take(Square::new(mv.to.file(), mv.from.rank()));
        }

        if castling {
            let rank = mv.from.rank();
            let (rook_from, rook_to) = if mv.to.file() == 6 {
                (Square::new(7, rank), Square::new(5, rank))
            } else {
                (Square::new(0, rank), Square::new(3, rank))
            };
            if let Some(rook) = next.take(rook_from) {
                next.put(rook_to, rook);
            }
        }

        let placed = match mv.promotion {
            Some(role) if piece.role == Role::Pawn => Piece::new(us, role),
            _ => piece,
        };
        next.put(mv.to, placed);

        if piece.role == Role::King {
            next.castling.clear(us);
        }
        next.castling.touch(mv.from);
        next.castling.touch(mv.to);

        next.ep_square = None;
        if piece.role == Role::Pawn && (mv.to.rank() as i8 - mv.from.rank() as i8).abs() == 2 {
            next.ep_square = mv.from.offset(0, us.forward());
        }

        if piece.role == Role::Pawn || captured.is_some() || en_passant {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }
        next.turn = us.opposite();
        next
    }

    /// Find the legal move matching a UCI move's squares and promotion.
    pub fn find_legal(&self, candidate: &Move) -> Option<Move> {
        self.legal_moves().into_iter().find(|mv| mv == candidate)
    }

    /// Whether an en-passant capture is actually legal right now.
    pub fn has_legal_en_passant(&self) -> bool {
        match self.ep_square {
            Some(ep) => self
                .legal_moves()
                .iter()
                .any(|mv| mv.to == ep && self.is_en_passant(mv)),
            None => false,
        }
    }
}

fn push_pawn_move(from: Square, to: Square, promo_rank: u8, moves: &mut Vec<Move>) {
    if to.rank() == promo_rank {
        for role in Role::PROMOTIONS {
            moves.push(Move::with_promotion(from, to, role));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}
