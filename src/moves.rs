use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::board::{square_name, Board, Pos};
use crate::piece::{Piece, PieceType};

/// A single move, snapshotting the board at the time it was generated.
///
/// Equality and hashing look at `from` and `to` only, so coordinates picked by
/// a user can be matched against generated moves.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
    pub piece: Piece,
    /// What stood on `to` before the move. `None` for en passant, whose
    /// victim sits behind the destination.
    pub captured: Option<Piece>,
    pub is_promotion: bool,
    pub is_en_passant: bool,
    pub is_castling: bool,
}

impl Move {
    pub fn new(board: &Board, from: Pos, to: Pos, piece: Piece, en_passant_target: Option<Pos>) -> Self {
        let captured = board.get(to);
        let is_pawn = piece.piece_type == PieceType::Pawn;
        Move {
            from,
            to,
            piece,
            captured,
            is_promotion: is_pawn && to.0 == piece.color.promotion_row(),
            is_en_passant: is_pawn
                && from.1 != to.1
                && captured.is_none()
                && en_passant_target == Some(to),
            is_castling: piece.piece_type == PieceType::King
                && (to.1 as i32 - from.1 as i32).abs() == 2,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some() || self.is_en_passant
    }

    /// Square of the pawn removed by an en-passant capture: directly behind
    /// the destination, from the mover's point of view.
    pub fn en_passant_victim(&self) -> Option<Pos> {
        if !self.is_en_passant {
            return None;
        }
        let row = self.to.0 as i32 - self.piece.color.forward();
        Some((row as usize, self.to.1))
    }

    /// Rook (from, to) for a castling move.
    pub fn castling_rook(&self) -> Option<(Pos, Pos)> {
        if !self.is_castling {
            return None;
        }
        let row = self.from.0;
        if self.to.1 > self.from.1 {
            Some(((row, 7), (row, 5)))
        } else {
            Some(((row, 0), (row, 3)))
        }
    }

    /// Algebraic-style notation, e.g. "e4", "Nf3", "exd5", "Qxh4", "O-O", "e8=Q".
    pub fn notation(&self) -> String {
        if self.is_castling {
            return if self.to.1 > self.from.1 { "O-O".into() } else { "O-O-O".into() };
        }

        let mut out = String::new();
        if self.piece.piece_type == PieceType::Pawn {
            if self.is_capture() {
                out.push((b'a' + self.from.1 as u8) as char);
                out.push('x');
            }
        } else {
            out.push(self.piece.piece_type.letter());
            if self.is_capture() {
                out.push('x');
            }
        }
        out.push_str(&square_name(self.to));
        if self.is_promotion {
            out.push_str("=Q");
        }
        out
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notation())
    }
}
