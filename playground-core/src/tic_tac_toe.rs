use crate::{GameEvent, GameEventBus, GameEventHandler, GameId, GameKind, ScoreRecorder};
use playground_types::{BoardOutcome, Cell, MoveError, SessionTally, Side};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

pub const BOARD_SIZE: usize = 9;
pub const CENTER: usize = 4;

/// The eight winning triples: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
    }

    pub fn has_triple(&self, side: Side) -> bool {
        let mark = Cell::from(side);
        LINES
            .iter()
            .any(|line| line.iter().all(|&index| self.cells[index] == mark))
    }

    /// Copy of the board with `index` claimed by `side`.
    pub fn with_claim(&self, index: usize, side: Side) -> Board {
        let mut next = *self;
        next.cells[index] = Cell::from(side);
        next
    }

    /// Outcome implied by the marks alone.
    pub fn evaluate(&self) -> BoardOutcome {
        if self.has_triple(Side::Player) {
            BoardOutcome::PlayerWin
        } else if self.has_triple(Side::Opponent) {
            BoardOutcome::OpponentWin
        } else if self.is_full() {
            BoardOutcome::Draw
        } else {
            BoardOutcome::InProgress
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Pick the opponent's cell: win, else block, else center, else random.
///
/// Within the win and block tiers the lowest index is taken. Returns `None`
/// only for a full board.
pub fn choose_opponent_cell<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    let empty: Vec<usize> = board.empty_cells().collect();

    let completing = |side: Side| {
        empty
            .iter()
            .copied()
            .find(|&index| board.with_claim(index, side).has_triple(side))
    };

    completing(Side::Opponent)
        .or_else(|| completing(Side::Player))
        .or_else(|| empty.contains(&CENTER).then_some(CENTER))
        .or_else(|| empty.choose(rng).copied())
}

/// Pure tic-tac-toe state machine with a running session tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeGame {
    board: Board,
    turn: Option<Side>,
    outcome: BoardOutcome,
    tally: SessionTally,
}

impl TicTacToeGame {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Some(Side::Player),
            outcome: BoardOutcome::InProgress,
            tally: SessionTally::default(),
        }
    }

    /// Resume from an arbitrary position with `turn` to move.
    pub fn from_board(board: Board, turn: Side) -> Self {
        let outcome = board.evaluate();
        Self {
            board,
            turn: (!outcome.is_terminal()).then_some(turn),
            outcome,
            tally: SessionTally::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move, `None` once the game is over.
    pub fn turn(&self) -> Option<Side> {
        self.turn
    }

    pub fn outcome(&self) -> BoardOutcome {
        self.outcome
    }

    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    /// Claim `index` for the player. On a non-terminal result the turn passes
    /// to the opponent before this returns.
    pub fn player_move(&mut self, index: usize) -> Result<BoardOutcome, MoveError> {
        self.check_move(Side::Player, Some(index))?;
        Ok(self.claim(index, Side::Player))
    }

    /// Let the heuristic opponent claim a cell. Returns the cell and outcome.
    pub fn opponent_move<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(usize, BoardOutcome), MoveError> {
        self.check_move(Side::Opponent, None)?;
        let index = choose_opponent_cell(&self.board, rng).ok_or(MoveError::GameOver)?;
        Ok((index, self.claim(index, Side::Opponent)))
    }

    /// Clear the board for a new game; the tally is kept.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.turn = Some(Side::Player);
        self.outcome = BoardOutcome::InProgress;
    }

    /// Clear the board and the tally.
    pub fn new_session(&mut self) {
        self.reset();
        self.tally = SessionTally::default();
    }

    fn check_move(&self, side: Side, index: Option<usize>) -> Result<(), MoveError> {
        if self.outcome.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if self.turn != Some(side) {
            return Err(match side {
                Side::Player => MoveError::NotPlayerTurn,
                Side::Opponent => MoveError::NotOpponentTurn,
            });
        }
        if let Some(index) = index {
            match self.board.get(index) {
                None => return Err(MoveError::CellOutOfBounds { index }),
                Some(cell) if !cell.is_empty() => return Err(MoveError::CellOccupied { index }),
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn claim(&mut self, index: usize, side: Side) -> BoardOutcome {
        self.board = self.board.with_claim(index, side);

        self.outcome = if self.board.has_triple(side) {
            match side {
                Side::Player => BoardOutcome::PlayerWin,
                Side::Opponent => BoardOutcome::OpponentWin,
            }
        } else if self.board.is_full() {
            BoardOutcome::Draw
        } else {
            BoardOutcome::InProgress
        };

        if self.outcome.is_terminal() {
            self.turn = None;
            self.tally.record(self.outcome);
        } else {
            self.turn = Some(side.other());
        }

        self.outcome
    }
}

impl Default for TicTacToeGame {
    fn default() -> Self {
        Self::new()
    }
}

/// What one call to [`TicTacToeEngine::play_turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub player_cell: usize,
    pub opponent_cell: Option<usize>,
    pub outcome: BoardOutcome,
}

/// Tic-tac-toe against the heuristic opponent, bound to one user's record.
pub struct TicTacToeEngine<R = StdRng> {
    game: TicTacToeGame,
    game_id: GameId,
    recorder: ScoreRecorder,
    rng: R,
    events: GameEventBus,
}

impl TicTacToeEngine<StdRng> {
    pub fn new(recorder: ScoreRecorder) -> Self {
        Self::with_rng(recorder, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> TicTacToeEngine<R> {
    /// The opening game publishes no `GameStarted`: handlers are attached
    /// afterwards. Use [`Self::game_id`] to identify it.
    pub fn with_rng(recorder: ScoreRecorder, rng: R) -> Self {
        Self {
            game: TicTacToeGame::new(),
            game_id: Uuid::new_v4(),
            recorder,
            rng,
            events: GameEventBus::new(),
        }
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn game(&self) -> &TicTacToeGame {
        &self.game
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Continue from a saved position; the session tally is kept.
    pub fn resume(&mut self, board: Board, turn: Side) {
        let tally = self.game.tally;
        self.game = TicTacToeGame::from_board(board, turn);
        self.game.tally = tally;
        self.start_game();
    }

    pub async fn player_move(&mut self, index: usize) -> Result<BoardOutcome, MoveError> {
        let outcome = self.game.player_move(index)?;
        self.after_claim(Side::Player, index, outcome).await;
        Ok(outcome)
    }

    pub async fn opponent_move(&mut self) -> Result<(usize, BoardOutcome), MoveError> {
        let (index, outcome) = self.game.opponent_move(&mut self.rng)?;
        self.after_claim(Side::Opponent, index, outcome).await;
        Ok((index, outcome))
    }

    /// Player move immediately followed by the opponent's reply, if any.
    pub async fn play_turn(&mut self, index: usize) -> Result<TurnReport, MoveError> {
        let mut outcome = self.player_move(index).await?;
        let mut opponent_cell = None;

        if self.game.turn() == Some(Side::Opponent) {
            let (cell, after) = self.opponent_move().await?;
            opponent_cell = Some(cell);
            outcome = after;
        }

        Ok(TurnReport {
            player_cell: index,
            opponent_cell,
            outcome,
        })
    }

    /// New board, same session.
    pub fn reset(&mut self) {
        self.game.reset();
        self.start_game();
    }

    /// New board and a zeroed session tally.
    pub fn new_session(&mut self) {
        self.game.new_session();
        self.start_game();
    }

    fn start_game(&mut self) {
        self.game_id = Uuid::new_v4();
        self.events.publish(GameEvent::GameStarted {
            game_id: self.game_id,
            kind: GameKind::TicTacToe,
        });
    }

    async fn after_claim(&mut self, side: Side, index: usize, outcome: BoardOutcome) {
        debug!("{:?} claimed cell {} in game {}", side, index, self.game_id);
        self.events.publish(GameEvent::CellClaimed {
            game_id: self.game_id,
            side,
            index,
        });

        if outcome.is_terminal() {
            info!(
                "Tic-tac-toe game {} for {} ended: {:?}",
                self.game_id,
                self.recorder.username(),
                outcome
            );
            self.recorder
                .record_game(outcome == BoardOutcome::PlayerWin)
                .await;
            self.events.publish(GameEvent::board_finished(
                self.game_id,
                self.recorder.username(),
                outcome,
            ));
        }
    }
}
