use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::piece::{Color, Piece, PieceType};

/// (row, col); row 0 is Black's back rank, col 0 is the a-file.
pub type Pos = (usize, usize);

/// Contents of one square.
pub type Square = Option<Piece>;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

pub const START_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    pub squares: [[Square; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut squares = [[None; 8]; 8];

        // Black pieces (rows 0-1)
        for (col, pt) in BACK_RANK.iter().enumerate() {
            squares[0][col] = Some(Piece::new(*pt, Color::Black));
        }
        for sq in &mut squares[1] {
            *sq = Some(Piece::new(PieceType::Pawn, Color::Black));
        }

        // White pieces (rows 6-7)
        for sq in &mut squares[6] {
            *sq = Some(Piece::new(PieceType::Pawn, Color::White));
        }
        for (col, pt) in BACK_RANK.iter().enumerate() {
            squares[7][col] = Some(Piece::new(*pt, Color::White));
        }

        Board { squares }
    }

    pub fn in_bounds(row: i32, col: i32) -> bool {
        (0..8).contains(&row) && (0..8).contains(&col)
    }

    /// Step from `pos` by a signed delta, or `None` if that leaves the board.
    pub fn offset(pos: Pos, dr: i32, dc: i32) -> Option<Pos> {
        let r = pos.0 as i32 + dr;
        let c = pos.1 as i32 + dc;
        if Self::in_bounds(r, c) {
            Some((r as usize, c as usize))
        } else {
            None
        }
    }

    pub fn check_pos(pos: Pos) -> Result<Pos, ChessError> {
        if pos.0 < 8 && pos.1 < 8 {
            Ok(pos)
        } else {
            Err(ChessError::OutOfBounds { row: pos.0, col: pos.1 })
        }
    }

    pub fn get(&self, pos: Pos) -> Square {
        self.squares[pos.0][pos.1]
    }

    pub fn set(&mut self, pos: Pos, sq: Square) {
        self.squares[pos.0][pos.1] = sq;
    }

    pub fn is_empty(&self, pos: Pos) -> bool {
        self.get(pos).is_none()
    }

    pub fn color_at(&self, pos: Pos) -> Option<Color> {
        self.get(pos).map(|p| p.color)
    }

    /// Scans the grid; only used when a position is first set up.
    pub fn find_king(&self, color: Color) -> Option<Pos> {
        self.pieces(color)
            .find(|(_, p)| p.piece_type == PieceType::King)
            .map(|(pos, _)| pos)
    }

    /// Every square holding a piece of `color`, in row-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        (0..8usize)
            .flat_map(|r| (0..8usize).map(move |c| (r, c)))
            .filter_map(move |pos| match self.get(pos) {
                Some(p) if p.color == color => Some((pos, p)),
                _ => None,
            })
    }

    /// Squares on the straight line from `from` to `to`, excluding `from` and
    /// including `to`. Empty unless the two squares share a rank, file or
    /// diagonal.
    pub fn path(from: Pos, to: Pos) -> Vec<Pos> {
        let dr = to.0 as i32 - from.0 as i32;
        let dc = to.1 as i32 - from.1 as i32;
        if (dr == 0 && dc == 0) || (dr != 0 && dc != 0 && dr.abs() != dc.abs()) {
            return Vec::new();
        }
        let (sr, sc) = (dr.signum(), dc.signum());
        let steps = dr.abs().max(dc.abs());
        (1..=steps)
            .map(|i| {
                (
                    (from.0 as i32 + sr * i) as usize,
                    (from.1 as i32 + sc * i) as usize,
                )
            })
            .collect()
    }

    /// True when every square strictly between `from` and `to` is empty.
    pub fn is_path_clear(&self, from: Pos, to: Pos) -> bool {
        let path = Self::path(from, to);
        match path.split_last() {
            Some((_, between)) => between.iter().all(|&p| self.is_empty(p)),
            None => false,
        }
    }

    /// Parse the piece-placement field of a FEN record (rank 8 first).
    pub fn from_placement(placement: &str) -> Result<Self, ChessError> {
        let mut board = Board::empty();
        let ranks: Vec<&str> = placement.trim().split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidPlacement(format!(
                "expected 8 ranks, found {}",
                ranks.len()
            )));
        }
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for ch in rank.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(ChessError::InvalidPlacement(format!("bad skip {ch:?}")));
                    }
                    col += skip as usize;
                } else {
                    let piece = Piece::from_char(ch).ok_or_else(|| {
                        ChessError::InvalidPlacement(format!("unknown piece {ch:?}"))
                    })?;
                    if col >= 8 {
                        return Err(ChessError::InvalidPlacement(format!(
                            "rank {} overflows",
                            8 - row
                        )));
                    }
                    board.squares[row][col] = Some(piece);
                    col += 1;
                }
                if col > 8 {
                    return Err(ChessError::InvalidPlacement(format!("rank {} overflows", 8 - row)));
                }
            }
            if col != 8 {
                return Err(ChessError::InvalidPlacement(format!(
                    "rank {} has {col} files",
                    8 - row
                )));
            }
        }
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces(color)
                .filter(|(_, p)| p.piece_type == PieceType::King)
                .count();
            if kings != 1 {
                return Err(ChessError::KingCount(color, kings));
            }
        }
        Ok(board)
    }

    pub fn to_placement(&self) -> String {
        let mut out = String::new();
        for (row, rank) in self.squares.iter().enumerate() {
            let mut gap = 0;
            for sq in rank {
                match sq {
                    Some(p) => {
                        if gap > 0 {
                            out.push_str(&gap.to_string());
                            gap = 0;
                        }
                        out.push(p.to_char());
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                out.push_str(&gap.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }
}

/// Algebraic name of a square, e.g. (6, 4) -> "e2".
pub fn square_name(pos: Pos) -> String {
    let file = (b'a' + pos.1 as u8) as char;
    format!("{file}{}", 8 - pos.0)
}

pub fn parse_square(s: &str) -> Result<Pos, ChessError> {
    let bytes = s.trim().as_bytes();
    if bytes.len() != 2 {
        return Err(ChessError::InvalidSquare(s.to_string()));
    }
    let file = bytes[0].to_ascii_lowercase();
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(ChessError::InvalidSquare(s.to_string()));
    }
    Ok((8 - (rank - b'0') as usize, (file - b'a') as usize))
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, rank) in self.squares.iter().enumerate() {
            write!(f, "{} ", 8 - row)?;
            for sq in rank {
                let c = sq.map(|p| p.to_char()).unwrap_or('.');
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_orientation() {
        let board = Board::new();
        assert_eq!(board.get((0, 4)), Some(Piece::new(PieceType::King, Color::Black)));
        assert_eq!(board.get((7, 4)), Some(Piece::new(PieceType::King, Color::White)));
        assert_eq!(board.get((7, 3)), Some(Piece::new(PieceType::Queen, Color::White)));
        assert_eq!(board.get((6, 0)), Some(Piece::new(PieceType::Pawn, Color::White)));
        assert!(board.is_empty((4, 4)));
        assert_eq!(board.to_placement(), START_PLACEMENT);
    }

    #[test]
    fn placement_parses_back_to_start() {
        assert_eq!(Board::from_placement(START_PLACEMENT).unwrap(), Board::new());
    }

    #[test]
    fn placement_rejects_malformed_input() {
        assert!(matches!(
            Board::from_placement("8/8/8"),
            Err(ChessError::InvalidPlacement(_))
        ));
        assert!(matches!(
            Board::from_placement("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(ChessError::InvalidPlacement(_))
        ));
        assert!(matches!(
            Board::from_placement("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNZ"),
            Err(ChessError::InvalidPlacement(_))
        ));
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/4K3"),
            Err(ChessError::KingCount(Color::Black, 0))
        );
    }

    #[test]
    fn square_names() {
        assert_eq!(square_name((6, 4)), "e2");
        assert_eq!(square_name((0, 0)), "a8");
        assert_eq!(square_name((7, 7)), "h1");
        assert_eq!(parse_square("e4").unwrap(), (4, 4));
        assert_eq!(parse_square("A1").unwrap(), (7, 0));
        assert!(parse_square("i9").is_err());
        assert!(parse_square("e").is_err());
    }

    #[test]
    fn path_excludes_origin_and_includes_destination() {
        assert_eq!(Board::path((7, 0), (4, 0)), vec![(6, 0), (5, 0), (4, 0)]);
        assert_eq!(Board::path((7, 2), (5, 4)), vec![(6, 3), (5, 4)]);
        assert!(Board::path((7, 1), (5, 2)).is_empty());

        let board = Board::new();
        assert!(!board.is_path_clear((7, 0), (4, 0)));
        assert!(board.is_path_clear((6, 4), (4, 4)));
    }

    #[test]
    fn offset_respects_edges() {
        assert_eq!(Board::offset((0, 0), -1, 0), None);
        assert_eq!(Board::offset((0, 0), 1, 2), Some((1, 2)));
        assert!(Board::check_pos((8, 0)).is_err());
    }
}
