use playground_types::{BoardOutcome, Feedback, Side};
use uuid::Uuid;

pub type GameId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    NumberGuess,
    TicTacToe,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        game_id: GameId,
        kind: GameKind,
    },
    GuessEvaluated {
        game_id: GameId,
        input: String,
        feedback: Feedback,
    },
    CellClaimed {
        game_id: GameId,
        side: Side,
        index: usize,
    },
    GameFinished {
        game_id: GameId,
        kind: GameKind,
        username: String,
        won: bool,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            GameEvent::GameStarted { game_id, .. } => *game_id,
            GameEvent::GuessEvaluated { game_id, .. } => *game_id,
            GameEvent::CellClaimed { game_id, .. } => *game_id,
            GameEvent::GameFinished { game_id, .. } => *game_id,
        }
    }

    /// Finished-game event for a tic-tac-toe board outcome.
    pub fn board_finished(game_id: GameId, username: &str, outcome: BoardOutcome) -> Self {
        GameEvent::GameFinished {
            game_id,
            kind: GameKind::TicTacToe,
            username: username.to_string(),
            won: outcome == BoardOutcome::PlayerWin,
        }
    }
}

/// Event handler trait for observing game progress
pub trait GameEventHandler: Send {
    fn handle_event(&mut self, event: GameEvent);
}

/// Simple event bus for distributing game events
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, event: GameEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}
