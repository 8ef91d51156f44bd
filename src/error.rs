use thiserror::Error;

use crate::piece::Color;

/// Failures at the text/coordinate boundary of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("invalid square name: {0:?}")]
    InvalidSquare(String),

    #[error("coordinate out of bounds: ({row}, {col})")]
    OutOfBounds { row: usize, col: usize },

    #[error("invalid placement string: {0}")]
    InvalidPlacement(String),

    #[error("expected exactly one {0} king, found {1}")]
    KingCount(Color, usize),

    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: String, to: String },

    #[error("no moves to undo")]
    NothingToUndo,
}
