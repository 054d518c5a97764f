use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Why a tic-tac-toe move was refused. The board is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum MoveError {
    #[error("The game is already over")]
    GameOver,
    #[error("It is not the player's turn")]
    NotPlayerTurn,
    #[error("It is not the opponent's turn")]
    NotOpponentTurn,
    #[error("Cell {index} is outside the board")]
    CellOutOfBounds { index: usize },
    #[error("Cell {index} is already taken")]
    CellOccupied { index: usize },
}
