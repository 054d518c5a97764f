use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One of the two tic-tac-toe participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Side {
    Player,   // X
    Opponent, // O
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Cell {
    #[default]
    Empty,
    Player,
    Opponent,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Player => 'X',
            Cell::Opponent => 'O',
        }
    }
}

impl From<Side> for Cell {
    fn from(side: Side) -> Self {
        match side {
            Side::Player => Cell::Player,
            Side::Opponent => Cell::Opponent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BoardOutcome {
    #[default]
    InProgress,
    PlayerWin,
    OpponentWin,
    Draw,
}

impl BoardOutcome {
    pub fn is_terminal(self) -> bool {
        self != BoardOutcome::InProgress
    }
}

/// Result of evaluating one number-guess input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Feedback {
    OutOfRange,             // not an integer in 1..=100, tries untouched
    Higher,                 // the target is above the guess
    Lower,                  // the target is below the guess
    Correct { tries: u32 }, // solved on this try
    AlreadyWon,             // game already solved, nothing changed
}

/// Running tic-tac-toe score kept for the lifetime of a play session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionTally {
    pub player_score: u32,
    pub opponent_score: u32,
    pub games_played: u32,
}

impl SessionTally {
    pub fn draws(&self) -> u32 {
        self.games_played
            .saturating_sub(self.player_score)
            .saturating_sub(self.opponent_score)
    }

    pub fn record(&mut self, outcome: BoardOutcome) {
        match outcome {
            BoardOutcome::InProgress => return,
            BoardOutcome::PlayerWin => self.player_score += 1,
            BoardOutcome::OpponentWin => self.opponent_score += 1,
            BoardOutcome::Draw => {}
        }
        self.games_played += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_draws() {
        let mut tally = SessionTally::default();
        tally.record(BoardOutcome::PlayerWin);
        tally.record(BoardOutcome::Draw);
        tally.record(BoardOutcome::OpponentWin);
        tally.record(BoardOutcome::InProgress);

        assert_eq!(tally.games_played, 3);
        assert_eq!(tally.player_score, 1);
        assert_eq!(tally.opponent_score, 1);
        assert_eq!(tally.draws(), 1);
    }

    #[test]
    fn test_inconsistent_tally_has_no_draws() {
        let tally = SessionTally {
            player_score: 3,
            opponent_score: 2,
            games_played: 4,
        };
        assert_eq!(tally.draws(), 0);
    }

    #[test]
    fn test_side_cells() {
        assert_eq!(Cell::from(Side::Player), Cell::Player);
        assert_eq!(Cell::from(Side::Opponent.other()), Cell::Player);
        assert!(Cell::default().is_empty());
        assert!(!BoardOutcome::InProgress.is_terminal());
        assert!(BoardOutcome::Draw.is_terminal());
    }
}
