use crate::board::{square_name, Pos};
use crate::error::ChessError;
use crate::game::{BoardSnapshot, GameState};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct MoveJson {
    from: [usize; 2],
    to: [usize; 2],
    notation: String,
}

#[derive(Serialize)]
struct BoardState {
    #[serde(flatten)]
    snapshot: BoardSnapshot,
    legal_moves: Vec<MoveJson>,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    board_state: Option<BoardState>,
    error: Option<String>,
}

fn build_board_state(state: &mut GameState) -> BoardState {
    let legal_moves = state
        .legal_moves()
        .iter()
        .map(|m| MoveJson {
            from: [m.from.0, m.from.1],
            to: [m.to.0, m.to.1],
            notation: m.notation(),
        })
        .collect();
    BoardState {
        snapshot: state.snapshot(),
        legal_moves,
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub struct Game {
    state: GameState,
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game {
            state: GameState::new(),
        }
    }

    pub fn get_board_state(&mut self) -> JsValue {
        to_js(&build_board_state(&mut self.state))
    }

    pub fn make_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> JsValue {
        let result = match self.state.try_move((from_row, from_col), (to_row, to_col)) {
            Ok(_) => MoveResult {
                board_state: Some(build_board_state(&mut self.state)),
                error: None,
            },
            Err(e) => MoveResult {
                board_state: None,
                error: Some(e.to_string()),
            },
        };
        to_js(&result)
    }

    pub fn undo(&mut self) -> JsValue {
        let result = match self.state.undo_move().ok_or(ChessError::NothingToUndo) {
            Ok(_) => MoveResult {
                board_state: Some(build_board_state(&mut self.state)),
                error: None,
            },
            Err(e) => MoveResult {
                board_state: None,
                error: Some(e.to_string()),
            },
        };
        to_js(&result)
    }

    pub fn get_legal_moves_for_square(&mut self, row: usize, col: usize) -> JsValue {
        let from: Pos = (row, col);
        let targets: Vec<String> = self
            .state
            .legal_moves()
            .iter()
            .filter(|m| m.from == from)
            .map(|m| square_name(m.to))
            .collect();
        to_js(&targets)
    }
}
