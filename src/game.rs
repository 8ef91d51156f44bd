//! Authoritative game state: executes and reverses moves, filters pseudo-legal
//! moves for king safety and detects check, checkmate and stalemate.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::board::{square_name, Board, Pos, START_PLACEMENT};
use crate::error::ChessError;
use crate::movegen::MoveGen;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    /// Rights that still make sense for `board`: king and rook on their
    /// original squares.
    pub fn from_board(board: &Board) -> Self {
        let has = |pos: Pos, pt: PieceType, color: Color| board.get(pos) == Some(Piece::new(pt, color));
        let flank = |color: Color, rook_col: usize| {
            let row = color.back_rank();
            has((row, 4), PieceType::King, color) && has((row, rook_col), PieceType::Rook, color)
        };
        CastlingRights {
            white_kingside: flank(Color::White, 7),
            white_queenside: flank(Color::White, 0),
            black_kingside: flank(Color::Black, 7),
            black_queenside: flank(Color::Black, 0),
        }
    }

    /// (kingside, queenside) for `color`.
    pub fn for_color(&self, color: Color) -> (bool, bool) {
        match color {
            Color::White => (self.white_kingside, self.white_queenside),
            Color::Black => (self.black_kingside, self.black_queenside),
        }
    }

    fn revoke_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// A move from or onto a rook's home corner ends castling on that flank.
    fn revoke_corner(&mut self, pos: Pos) {
        match pos {
            (7, 0) => self.white_queenside = false,
            (7, 7) => self.white_kingside = false,
            (0, 0) => self.black_queenside = false,
            (0, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

/// Derived view of the game for the presentation layer. Check is never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
}

/// One executed move plus the state it overwrote.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LogEntry {
    mv: Move,
    en_passant_target: Option<Pos>,
    castling_rights: CastlingRights,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_target: Option<Pos>,
    king_positions: [Pos; 2],
    move_log: Vec<LogEntry>,
    checkmate: bool,
    stalemate: bool,
}

/// Serializable snapshot handed to callers that render the game.
#[derive(Clone, Debug, Serialize)]
pub struct BoardSnapshot {
    pub placement: String,
    pub squares: [[Option<Piece>; 8]; 8],
    pub side_to_move: Color,
    pub status: GameStatus,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<String>,
    pub history: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        let board = Board::new();
        GameState {
            board,
            side_to_move: Color::White,
            castling_rights: CastlingRights::all(),
            en_passant_target: None,
            king_positions: [(7, 4), (0, 4)],
            move_log: Vec::new(),
            checkmate: false,
            stalemate: false,
        }
    }

    /// Set up a position from a FEN piece-placement field. Castling rights are
    /// granted wherever king and rook still stand on their original squares.
    pub fn from_placement(placement: &str, side_to_move: Color) -> Result<Self, ChessError> {
        let board = Board::from_placement(placement)?;
        let king = |color: Color| board.find_king(color).ok_or(ChessError::KingCount(color, 0));
        let mut state = GameState {
            board,
            side_to_move,
            castling_rights: CastlingRights::from_board(&board),
            en_passant_target: None,
            king_positions: [king(Color::White)?, king(Color::Black)?],
            move_log: Vec::new(),
            checkmate: false,
            stalemate: false,
        };
        state.refresh_status();
        Ok(state)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Pos> {
        self.en_passant_target
    }

    pub fn king_position(&self, color: Color) -> Pos {
        self.king_positions[color.index()]
    }

    pub fn is_checkmate(&self) -> bool {
        self.checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.stalemate
    }

    pub fn is_game_over(&self) -> bool {
        self.checkmate || self.stalemate
    }

    /// Executed moves, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Move> + '_ {
        self.move_log.iter().map(|e| &e.mv)
    }

    pub fn status(&self) -> GameStatus {
        if self.checkmate {
            GameStatus::Checkmate
        } else if self.stalemate {
            GameStatus::Stalemate
        } else if self.in_check(self.side_to_move) {
            GameStatus::Check
        } else {
            GameStatus::InProgress
        }
    }

    /// Apply a move drawn from `generate_legal_moves`. No legality check is
    /// made here; terminal flags are left untouched.
    pub fn execute_move(&mut self, mv: Move) {
        assert_eq!(
            self.board.get(mv.from),
            Some(mv.piece),
            "stale move {mv} executed"
        );
        let color = mv.piece.color;
        self.move_log.push(LogEntry {
            mv,
            en_passant_target: self.en_passant_target,
            castling_rights: self.castling_rights,
        });

        let placed = if mv.is_promotion {
            Piece::new(PieceType::Queen, color)
        } else {
            mv.piece
        };
        self.board.set(mv.from, None);
        self.board.set(mv.to, Some(placed));

        if let Some(victim) = mv.en_passant_victim() {
            self.board.set(victim, None);
        }
        if let Some((rook_from, rook_to)) = mv.castling_rook() {
            let rook = self.board.get(rook_from);
            self.board.set(rook_from, None);
            self.board.set(rook_to, rook);
        }

        if mv.piece.piece_type == PieceType::King {
            self.king_positions[color.index()] = mv.to;
            self.castling_rights.revoke_color(color);
        }
        self.castling_rights.revoke_corner(mv.from);
        self.castling_rights.revoke_corner(mv.to);

        let is_double_step = mv.piece.piece_type == PieceType::Pawn
            && (mv.from.0 as i32 - mv.to.0 as i32).abs() == 2;
        self.en_passant_target = if is_double_step {
            Some(((mv.from.0 + mv.to.0) / 2, mv.from.1))
        } else {
            None
        };

        self.side_to_move = self.side_to_move.opposite();
    }

    /// Reverse the last executed move. Returns `None` when there is nothing to
    /// undo. Clears the checkmate/stalemate flags.
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.unmake()?;
        self.checkmate = false;
        self.stalemate = false;
        debug!(mv = %mv, "undo");
        Some(mv)
    }

    fn unmake(&mut self) -> Option<Move> {
        let LogEntry {
            mv,
            en_passant_target,
            castling_rights,
        } = self.move_log.pop()?;
        let color = mv.piece.color;

        self.board.set(mv.from, Some(mv.piece));
        self.board.set(mv.to, mv.captured);

        if let Some(victim) = mv.en_passant_victim() {
            self.board
                .set(victim, Some(Piece::new(PieceType::Pawn, color.opposite())));
        }
        if let Some((rook_from, rook_to)) = mv.castling_rook() {
            let rook = self.board.get(rook_to);
            self.board.set(rook_to, None);
            self.board.set(rook_from, rook);
        }
        if mv.piece.piece_type == PieceType::King {
            self.king_positions[color.index()] = mv.from;
        }

        self.en_passant_target = en_passant_target;
        self.castling_rights = castling_rights;
        self.side_to_move = self.side_to_move.opposite();
        Some(mv)
    }

    /// Execute `mv` for the lifetime of the returned guard. Dropping the guard
    /// undoes it, along with anything executed through the guard since, and
    /// puts back the terminal flags.
    pub fn probe(&mut self, mv: Move) -> Probe<'_> {
        let depth = self.move_log.len();
        let flags = (self.checkmate, self.stalemate);
        self.execute_move(mv);
        Probe {
            state: self,
            depth,
            flags,
        }
    }

    /// True if any pseudo-legal move of `by` lands on `pos`. An empty square is
    /// tested by placing a stand-in target on a copy of the board, so pawns
    /// count as attacking diagonals they could capture on.
    pub fn is_square_attacked(&self, pos: Pos, by: Color) -> bool {
        let mut board = self.board;
        if board.is_empty(pos) {
            board.set(pos, Some(Piece::new(PieceType::Pawn, by.opposite())));
        }
        MoveGen::new(&board, None)
            .all_moves(by)
            .iter()
            .any(|m| m.to == pos)
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_position(color), color.opposite())
    }

    /// Geometry- and obstruction-valid moves, including castling. En-passant
    /// captures are only offered to the side to move.
    pub fn generate_pseudo_legal_moves(&self, color: Color) -> Vec<Move> {
        let en_passant = if color == self.side_to_move {
            self.en_passant_target
        } else {
            None
        };
        let generator = MoveGen::new(&self.board, en_passant);
        let mut moves = generator.all_moves(color);
        generator.castling_moves(
            color,
            self.castling_rights.for_color(color),
            |pos| self.is_square_attacked(pos, color.opposite()),
            &mut moves,
        );
        moves
    }

    /// Pseudo-legal moves that do not leave `color`'s king attacked. When
    /// `color` is the side to move this also records checkmate or stalemate.
    pub fn generate_legal_moves(&mut self, color: Color) -> Vec<Move> {
        let candidates = self.generate_pseudo_legal_moves(color);
        let legal: Vec<Move> = candidates
            .into_iter()
            .filter(|&mv| {
                let probe = self.probe(mv);
                let safe = !probe.in_check(color);
                if !safe {
                    trace!(mv = %mv, "leaves king in check");
                }
                safe
            })
            .collect();

        if color == self.side_to_move {
            let no_moves = legal.is_empty();
            let check = no_moves && self.in_check(color);
            self.checkmate = check;
            self.stalemate = no_moves && !check;
            if no_moves {
                debug!(side = %color, checkmate = self.checkmate, "no legal moves");
            }
        }
        legal
    }

    pub fn legal_moves(&mut self) -> Vec<Move> {
        self.generate_legal_moves(self.side_to_move)
    }

    fn refresh_status(&mut self) {
        self.legal_moves();
    }

    /// Match caller-supplied coordinates against the legal moves of the side
    /// to move.
    pub fn find_legal_move(&mut self, from: Pos, to: Pos) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from && m.to == to)
    }

    /// Move intake: execute the generated move matching `from`/`to`, or leave
    /// the state untouched and report why not.
    pub fn try_move(&mut self, from: Pos, to: Pos) -> Result<Move, ChessError> {
        Board::check_pos(from)?;
        Board::check_pos(to)?;
        let mv = self
            .find_legal_move(from, to)
            .ok_or_else(|| ChessError::IllegalMove {
                from: square_name(from),
                to: square_name(to),
            })?;
        self.execute_move(mv);
        self.refresh_status();
        debug!(mv = %mv, status = ?self.status(), "move");
        Ok(mv)
    }

    /// Same as `try_move` with square names such as "e2" and "e4".
    pub fn try_move_named(&mut self, from: &str, to: &str) -> Result<Move, ChessError> {
        let from = crate::board::parse_square(from)?;
        let to = crate::board::parse_square(to)?;
        self.try_move(from, to)
    }

    /// Numbered move list, e.g. "1. f3 e5 2. g4 Qh4".
    pub fn notation_log(&self) -> String {
        let mut out = String::new();
        let mut number = 1;
        let mut white_next = true;
        for (i, mv) in self.history().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match mv.piece.color {
                Color::White => {
                    out.push_str(&format!("{number}. {mv}"));
                    white_next = false;
                }
                Color::Black => {
                    if white_next {
                        out.push_str(&format!("{number}... "));
                    }
                    out.push_str(&mv.notation());
                    number += 1;
                    white_next = true;
                }
            }
        }
        out
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            placement: self.board.to_placement(),
            squares: self.board.squares,
            side_to_move: self.side_to_move,
            status: self.status(),
            castling_rights: self.castling_rights,
            en_passant_target: self.en_passant_target.map(square_name),
            history: self.history().map(Move::notation).collect(),
        }
    }

    /// True when no move has been made from the standard start.
    pub fn is_start_position(&self) -> bool {
        self.move_log.is_empty() && self.board.to_placement() == START_PLACEMENT
    }
}

/// Scoped hypothetical move; see [`GameState::probe`].
pub struct Probe<'a> {
    state: &'a mut GameState,
    depth: usize,
    flags: (bool, bool),
}

impl Probe<'_> {
    /// Mutable access for nested look-ahead. Everything executed through it is
    /// unwound when the probe drops.
    pub fn state_mut(&mut self) -> &mut GameState {
        self.state
    }
}

impl Deref for Probe<'_> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        self.state
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        while self.state.move_log.len() > self.depth {
            if self.state.unmake().is_none() {
                break;
            }
        }
        (self.state.checkmate, self.state.stalemate) = self.flags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: &mut GameState, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            state
                .try_move_named(from, to)
                .unwrap_or_else(|e| panic!("{from}{to}: {e}"));
        }
    }

    #[test]
    fn twenty_legal_moves_from_start() {
        let mut state = GameState::new();
        assert_eq!(state.legal_moves().len(), 20);
        assert_eq!(state.generate_legal_moves(Color::Black).len(), 20);
        assert_eq!(state.status(), GameStatus::InProgress);
        assert!(state.is_start_position());
    }

    #[test]
    fn execute_then_undo_restores_everything() {
        let mut state = GameState::new();
        play(&mut state, &[("e2", "e4"), ("d7", "d5")]);
        let before = state.clone();
        for mv in state.clone().legal_moves() {
            state.execute_move(mv);
            assert_ne!(state.board(), before.board());
            state.undo_move();
            assert_eq!(state, before, "after {mv}");
        }
    }

    #[test]
    fn probe_unwinds_nested_moves() {
        let mut state = GameState::new();
        let before = state.clone();
        let moves = state.legal_moves();
        {
            let mut probe = state.probe(moves[0]);
            let inner = probe.state_mut();
            let reply = inner.legal_moves()[0];
            inner.execute_move(reply);
            assert_eq!(inner.history().count(), 2);
        }
        assert_eq!(state, before);
    }

    #[test]
    fn fools_mate() {
        let mut state = GameState::new();
        play(
            &mut state,
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );
        assert!(state.is_checkmate());
        assert!(!state.is_stalemate());
        assert_eq!(state.status(), GameStatus::Checkmate);
        assert!(state.legal_moves().is_empty());
        assert_eq!(state.notation_log(), "1. f3 e5 2. g4 Qh4");

        state.undo_move();
        assert_eq!(state.status(), GameStatus::InProgress);
        assert!(!state.is_checkmate());
    }

    #[test]
    fn stalemate_is_not_checkmate() {
        let state = GameState::from_placement("k7/8/1Q6/8/8/8/8/7K", Color::Black).unwrap();
        assert!(state.is_stalemate());
        assert!(!state.is_checkmate());
        assert_eq!(state.status(), GameStatus::Stalemate);
    }

    #[test]
    fn check_is_derived_and_must_be_answered() {
        let mut state = GameState::from_placement("4k3/8/8/8/8/8/3PPP2/r3K3", Color::White).unwrap();
        // Pawns on d2-f2 box the king in; d1 and f1 stay on the rook's rank.
        assert_eq!(state.status(), GameStatus::Checkmate);
        assert!(state.is_checkmate());

        let mut state = GameState::from_placement("4k3/8/8/8/8/8/3P1P2/r3K3", Color::White).unwrap();
        assert_eq!(state.status(), GameStatus::Check);
        let moves = state.legal_moves();
        assert_eq!(moves.iter().map(|m| m.to).collect::<Vec<_>>(), vec![(6, 4)]);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // White knight e2 pinned by black rook e8 against king e1.
        let mut state = GameState::from_placement("4r2k/8/8/8/8/8/4N3/4K3", Color::White).unwrap();
        assert!(state.legal_moves().iter().all(|m| m.piece.piece_type != PieceType::Knight));
    }

    #[test]
    fn legal_moves_never_leave_own_king_in_check() {
        let mut state = GameState::from_placement("r3k2r/8/8/3q4/8/2B5/8/R3K2R", Color::White).unwrap();
        for mv in state.legal_moves() {
            let probe = state.probe(mv);
            assert!(!probe.in_check(Color::White), "{mv}");
        }
    }

    #[test]
    fn en_passant_capture_and_undo() {
        let mut state = GameState::new();
        play(&mut state, &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")]);
        assert_eq!(state.en_passant_target(), Some((2, 3)));
        let before = state.clone();

        let mv = state.try_move_named("e5", "d6").unwrap();
        assert!(mv.is_en_passant);
        assert_eq!(mv.notation(), "exd6");
        assert!(state.board().is_empty((3, 3)), "passed pawn removed");
        assert_eq!(
            state.board().get((2, 3)),
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert_eq!(state.en_passant_target(), None);

        state.undo_move();
        assert_eq!(state, before);
        assert_eq!(state.en_passant_target(), Some((2, 3)));
    }

    #[test]
    fn en_passant_expires_after_one_move() {
        let mut state = GameState::new();
        play(
            &mut state,
            &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5"), ("h2", "h3")],
        );
        assert_eq!(state.en_passant_target(), None);
        play(&mut state, &[("a6", "a5")]);
        assert!(state.try_move_named("e5", "d6").is_err());
    }

    #[test]
    fn promotion_makes_a_queen() {
        let mut state = GameState::from_placement("4k3/P7/8/8/8/8/8/4K3", Color::White).unwrap();
        let mv = state.try_move_named("a7", "a8").unwrap();
        assert!(mv.is_promotion);
        assert_eq!(
            state.board().get((0, 0)),
            Some(Piece::new(PieceType::Queen, Color::White))
        );
        assert_eq!(state.status(), GameStatus::Check);

        state.undo_move();
        assert_eq!(
            state.board().get((1, 0)),
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert!(state.board().is_empty((0, 0)));
    }

    #[test]
    fn castling_moves_rook_and_drops_rights() {
        let mut state = GameState::from_placement("r3k2r/8/8/8/8/8/8/R3K2R", Color::White).unwrap();
        assert_eq!(state.castling_rights(), CastlingRights::all());
        let before = state.clone();

        let mv = state.try_move_named("e1", "g1").unwrap();
        assert!(mv.is_castling);
        assert_eq!(mv.notation(), "O-O");
        assert_eq!(state.board().get((7, 5)).map(|p| p.piece_type), Some(PieceType::Rook));
        assert!(state.board().is_empty((7, 7)));
        assert_eq!(state.king_position(Color::White), (7, 6));
        assert_eq!(state.castling_rights().for_color(Color::White), (false, false));

        state.undo_move();
        assert_eq!(state, before);
    }

    #[test]
    fn rook_moves_and_captures_revoke_one_flank() {
        let mut state = GameState::from_placement("r3k2r/8/8/8/8/8/6b1/R3K2R", Color::Black).unwrap();
        state.try_move_named("g2", "h1").unwrap();
        assert_eq!(state.castling_rights().for_color(Color::White), (false, true));
        assert_eq!(state.castling_rights().for_color(Color::Black), (true, true));
        assert!(state.find_legal_move((7, 4), (7, 6)).is_none());
        assert!(state.find_legal_move((7, 4), (7, 2)).is_some());

        state.try_move_named("a1", "a3").unwrap();
        assert_eq!(state.castling_rights().for_color(Color::White), (false, false));
        assert_eq!(state.castling_rights().for_color(Color::Black), (true, true));
    }

    #[test]
    fn no_castling_through_attacked_square() {
        // Black rook f8 covers f1.
        let mut state = GameState::from_placement("5r1k/8/8/8/8/8/8/R3K2R", Color::White).unwrap();
        assert!(state.find_legal_move((7, 4), (7, 6)).is_none());
        assert!(state.find_legal_move((7, 4), (7, 2)).is_some());

        // Black pawn on e2 attacks f1 and d1.
        let mut state = GameState::from_placement("7k/8/8/8/8/8/4p3/R3K2R", Color::White).unwrap();
        assert!(state.find_legal_move((7, 4), (7, 6)).is_none());
        assert!(state.find_legal_move((7, 4), (7, 2)).is_none());
    }

    #[test]
    fn rejected_move_leaves_state_unchanged() {
        let mut state = GameState::new();
        let before = state.clone();
        assert!(matches!(
            state.try_move_named("e2", "e5"),
            Err(ChessError::IllegalMove { .. })
        ));
        assert!(state.try_move_named("e7", "e5").is_err(), "out of turn");
        assert!(matches!(
            state.try_move((8, 0), (7, 0)),
            Err(ChessError::OutOfBounds { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    #[should_panic(expected = "stale move")]
    fn executing_a_stale_move_panics() {
        let mut state = GameState::new();
        let mv = state.find_legal_move((6, 4), (4, 4)).unwrap();
        state.execute_move(mv);
        state.execute_move(mv);
    }

    #[test]
    fn undo_on_empty_log_is_a_no_op() {
        let mut state = GameState::new();
        let before = state.clone();
        assert!(state.undo_move().is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn king_positions_follow_the_king() {
        let mut state = GameState::new();
        play(&mut state, &[("e2", "e4"), ("e7", "e5"), ("e1", "e2")]);
        assert_eq!(state.king_position(Color::White), (6, 4));
        state.undo_move();
        assert_eq!(state.king_position(Color::White), (7, 4));
    }

    #[test]
    fn snapshot_serializes() {
        let mut state = GameState::new();
        play(&mut state, &[("e2", "e4")]);
        let snap = state.snapshot();
        assert_eq!(snap.en_passant_target.as_deref(), Some("e3"));
        assert_eq!(snap.history, vec!["e4".to_string()]);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["side_to_move"], "Black");
        assert_eq!(json["status"], "InProgress");
    }
}
