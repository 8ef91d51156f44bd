pub mod board;
pub mod error;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod perft;
pub mod piece;

#[cfg(target_arch = "wasm32")]
mod wasm_api;

pub use board::{parse_square, square_name, Board, Pos};
pub use error::ChessError;
pub use game::{BoardSnapshot, CastlingRights, GameState, GameStatus};
pub use moves::Move;
pub use piece::{Color, Piece, PieceType};
