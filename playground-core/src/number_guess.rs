use crate::{GameEvent, GameEventBus, GameEventHandler, GameId, GameKind, ScoreRecorder};
use playground_types::Feedback;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};
use uuid::Uuid;

pub const MIN_TARGET: u32 = 1;
pub const MAX_TARGET: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberGuessState {
    target: u32,
    tries: u32,
    won: bool,
}

impl NumberGuessState {
    /// Start a game with a target drawn uniformly from 1..=100.
    pub fn new_game<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            target: rng.gen_range(MIN_TARGET..=MAX_TARGET),
            tries: 0,
            won: false,
        }
    }

    /// Start a game with a known target; `None` when it is out of range.
    pub fn with_target(target: u32) -> Option<Self> {
        (MIN_TARGET..=MAX_TARGET).contains(&target).then_some(Self {
            target,
            tries: 0,
            won: false,
        })
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn won(&self) -> bool {
        self.won
    }

    /// Evaluate raw user input. Anything that is not an integer is out of range.
    pub fn apply_guess(&mut self, input: &str) -> Feedback {
        match input.trim().parse::<i64>() {
            Ok(value) => self.apply_number(value),
            Err(_) if self.won => Feedback::AlreadyWon,
            Err(_) => Feedback::OutOfRange,
        }
    }

    pub fn apply_number(&mut self, value: i64) -> Feedback {
        if self.won {
            return Feedback::AlreadyWon;
        }
        if value < MIN_TARGET as i64 || value > MAX_TARGET as i64 {
            return Feedback::OutOfRange;
        }

        self.tries += 1;
        match (value as u32).cmp(&self.target) {
            Ordering::Less => Feedback::Higher,
            Ordering::Greater => Feedback::Lower,
            Ordering::Equal => {
                self.won = true;
                Feedback::Correct { tries: self.tries }
            }
        }
    }
}

/// Number guessing bound to one user's score record.
pub struct NumberGuessEngine<R = StdRng> {
    state: NumberGuessState,
    game_id: GameId,
    recorder: ScoreRecorder,
    rng: R,
    events: GameEventBus,
}

impl NumberGuessEngine<StdRng> {
    pub fn new(recorder: ScoreRecorder) -> Self {
        Self::with_rng(recorder, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> NumberGuessEngine<R> {
    /// The opening game publishes no `GameStarted`: handlers are attached
    /// afterwards. Use [`Self::game_id`] to identify it.
    pub fn with_rng(recorder: ScoreRecorder, mut rng: R) -> Self {
        let state = NumberGuessState::new_game(&mut rng);
        Self {
            state,
            game_id: Uuid::new_v4(),
            recorder,
            rng,
            events: GameEventBus::new(),
        }
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn state(&self) -> &NumberGuessState {
        &self.state
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Evaluate a guess; a correct one is recorded as a won game exactly once.
    pub async fn guess(&mut self, input: &str) -> Feedback {
        let feedback = self.state.apply_guess(input);
        debug!("Guess {:?} in game {} -> {:?}", input, self.game_id, feedback);

        self.events.publish(GameEvent::GuessEvaluated {
            game_id: self.game_id,
            input: input.to_string(),
            feedback,
        });

        if let Feedback::Correct { tries } = feedback {
            info!(
                "{} solved number game {} in {} tries",
                self.recorder.username(),
                self.game_id,
                tries
            );
            self.recorder.record_game(true).await;
            self.events.publish(GameEvent::GameFinished {
                game_id: self.game_id,
                kind: GameKind::NumberGuess,
                username: self.recorder.username().to_string(),
                won: true,
            });
        }

        feedback
    }

    /// Throw away the current game and draw a new target.
    pub fn reset(&mut self) -> &NumberGuessState {
        self.state = NumberGuessState::new_game(&mut self.rng);
        self.start_game();
        &self.state
    }

    /// Continue a previously saved game in place of the current one.
    pub fn resume(&mut self, state: NumberGuessState) {
        self.state = state;
        self.start_game();
    }

    fn start_game(&mut self) {
        self.game_id = Uuid::new_v4();
        self.events.publish(GameEvent::GameStarted {
            game_id: self.game_id,
            kind: GameKind::NumberGuess,
        });
    }
}
