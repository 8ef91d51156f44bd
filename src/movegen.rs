//! Pseudo-legal move generation: piece geometry and obstruction only, no
//! king-safety filtering.

use crate::board::{Board, Pos};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

const ROOK_DIRS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const QUEEN_DIRS: [(i32, i32); 8] = [
    (0, 1), (0, -1), (1, 0), (-1, 0),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Read-only view of the position needed to generate moves.
pub struct MoveGen<'a> {
    pub board: &'a Board,
    pub en_passant_target: Option<Pos>,
}

impl<'a> MoveGen<'a> {
    pub fn new(board: &'a Board, en_passant_target: Option<Pos>) -> Self {
        MoveGen {
            board,
            en_passant_target,
        }
    }

    /// Every pseudo-legal move for the pieces of `color`, castling excluded.
    pub fn all_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (pos, piece) in self.board.pieces(color) {
            self.piece_moves(pos, piece, &mut moves);
        }
        moves
    }

    pub fn piece_moves(&self, pos: Pos, piece: Piece, moves: &mut Vec<Move>) {
        match piece.piece_type {
            PieceType::Pawn => self.pawn_moves(pos, piece, moves),
            PieceType::Knight => self.step_moves(pos, piece, &KNIGHT_OFFSETS, moves),
            PieceType::Bishop => self.sliding_moves(pos, piece, &BISHOP_DIRS, moves),
            PieceType::Rook => self.sliding_moves(pos, piece, &ROOK_DIRS, moves),
            PieceType::Queen => self.sliding_moves(pos, piece, &QUEEN_DIRS, moves),
            PieceType::King => self.step_moves(pos, piece, &KING_OFFSETS, moves),
        }
    }

    fn push(&self, from: Pos, to: Pos, piece: Piece, moves: &mut Vec<Move>) {
        moves.push(Move::new(self.board, from, to, piece, self.en_passant_target));
    }

    fn pawn_moves(&self, pos: Pos, piece: Piece, moves: &mut Vec<Move>) {
        let dir = piece.color.forward();

        // Single and double push
        if let Some(one) = Board::offset(pos, dir, 0) {
            if self.is_valid_pawn_move(pos, one, piece.color) {
                self.push(pos, one, piece, moves);
            }
            if pos.0 == piece.color.pawn_home_row() {
                if let Some(two) = Board::offset(pos, 2 * dir, 0) {
                    if self.is_valid_pawn_move(pos, two, piece.color) {
                        self.push(pos, two, piece, moves);
                    }
                }
            }
        }

        // Captures (including en passant)
        for dc in [-1, 1] {
            if let Some(to) = Board::offset(pos, dir, dc) {
                if self.is_valid_pawn_move(pos, to, piece.color) {
                    self.push(pos, to, piece, moves);
                }
            }
        }
    }

    /// Pawn-specific acceptance for a candidate that already has pawn shape.
    /// Straight moves need a clear path and an empty destination; diagonal
    /// moves need an opposing piece or the en-passant target.
    fn is_valid_pawn_move(&self, from: Pos, to: Pos, color: Color) -> bool {
        if from.1 == to.1 {
            self.board.is_path_clear(from, to) && self.board.is_empty(to)
        } else {
            match self.board.color_at(to) {
                Some(c) => c != color,
                None => self.en_passant_target == Some(to),
            }
        }
    }

    fn step_moves(&self, pos: Pos, piece: Piece, offsets: &[(i32, i32)], moves: &mut Vec<Move>) {
        for &(dr, dc) in offsets {
            let Some(to) = Board::offset(pos, dr, dc) else {
                continue;
            };
            if self.board.color_at(to) == Some(piece.color) {
                continue;
            }
            self.push(pos, to, piece, moves);
        }
    }

    fn sliding_moves(&self, pos: Pos, piece: Piece, directions: &[(i32, i32)], moves: &mut Vec<Move>) {
        for &(dr, dc) in directions {
            for step in 1..8 {
                let Some(to) = Board::offset(pos, dr * step, dc * step) else {
                    break;
                };
                match self.board.color_at(to) {
                    None => self.push(pos, to, piece, moves),
                    Some(c) => {
                        if c != piece.color {
                            self.push(pos, to, piece, moves);
                        }
                        break;
                    }
                }
            }
        }
    }

    /// Castling candidates for the king of `color` standing on its home square.
    /// `rights` is (kingside, queenside); `attacked(pos)` reports whether the
    /// opponent attacks a square.
    pub fn castling_moves<F>(
        &self,
        color: Color,
        rights: (bool, bool),
        attacked: F,
        moves: &mut Vec<Move>,
    ) where
        F: Fn(Pos) -> bool,
    {
        let row = color.back_rank();
        let king = Piece::new(PieceType::King, color);
        let rook = Some(Piece::new(PieceType::Rook, color));
        if self.board.get((row, 4)) != Some(king) {
            return;
        }
        let (kingside, queenside) = rights;
        if !kingside && !queenside {
            return;
        }
        if attacked((row, 4)) {
            return;
        }

        if kingside
            && self.board.get((row, 7)) == rook
            && self.board.is_path_clear((row, 4), (row, 7))
            && !attacked((row, 5))
            && !attacked((row, 6))
        {
            self.push((row, 4), (row, 6), king, moves);
        }

        if queenside
            && self.board.get((row, 0)) == rook
            && self.board.is_path_clear((row, 4), (row, 0))
            && !attacked((row, 3))
            && !attacked((row, 2))
        {
            self.push((row, 4), (row, 2), king, moves);
        }
    }
}
