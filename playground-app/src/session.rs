use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::commands::{Command, HELP};
use crate::config::Config;
use playground_core::{
    AccountError, AccountService, AdminService, NumberGuessEngine, ScoreStore, SignupRequest,
    StoreError, TicTacToeEngine, XP_PER_LEVEL, derive,
};
use playground_types::{BoardOutcome, Feedback, MoveError, Side};

/// Engines owned by the logged-in user.
struct ActiveUser {
    username: String,
    number_game: NumberGuessEngine,
    board_game: TicTacToeEngine,
}

/// Text the front-end should print, and whether to stop reading input.
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }

    fn push(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }
}

/// One terminal session: at most one user logged in at a time.
pub struct PlaygroundSession {
    config: Config,
    accounts: AccountService,
    admin: AdminService,
    user: Option<ActiveUser>,
}

impl PlaygroundSession {
    pub fn new(config: Config, store: Arc<ScoreStore>) -> Self {
        Self {
            config,
            accounts: AccountService::new(store.clone()),
            admin: AdminService::new(store),
            user: None,
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.username.as_str())
    }

    /// Run one command. Domain failures become reply text; only backend
    /// failures are returned as errors.
    pub async fn execute(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Help => Ok(Reply::line(HELP)),
            Command::Quit => Ok(Reply {
                lines: vec!["Bye!".to_string()],
                quit: true,
            }),
            Command::Signup {
                username,
                password,
                confirm_password,
                email,
            } => {
                let request = SignupRequest {
                    username,
                    password,
                    confirm_password,
                    email,
                };
                match self.accounts.signup(request).await {
                    Ok(record) => {
                        let mut reply = Reply::line("Account created successfully!");
                        reply.push(self.start_user(record.username));
                        Ok(reply)
                    }
                    Err(err) => account_failure(err),
                }
            }
            Command::Login { username, password } => {
                match self.accounts.login(&username, &password).await {
                    Ok(record) => Ok(Reply::line(self.start_user(record.username))),
                    Err(err) => account_failure(err),
                }
            }
            Command::Logout => match self.user.take() {
                Some(user) => {
                    info!("{} logged out", user.username);
                    Ok(Reply::line(format!("Goodbye, {}.", user.username)))
                }
                None => Ok(Reply::line("Nobody is logged in.")),
            },
            command => {
                let Some(username) = self.current_user().map(str::to_string) else {
                    return Ok(Reply::line("Please login or signup first."));
                };
                self.execute_for_user(&username, command).await
            }
        }
    }

    fn start_user(&mut self, username: String) -> String {
        let recorder = self.accounts.recorder_for(&username);
        let greeting = format!("Welcome, {}!", username);
        self.user = Some(ActiveUser {
            username,
            number_game: NumberGuessEngine::new(recorder.clone()),
            board_game: TicTacToeEngine::new(recorder),
        });
        greeting
    }

    async fn execute_for_user(&mut self, username: &str, command: Command) -> Result<Reply> {
        match command {
            Command::Guess(input) => {
                let Some(user) = self.user.as_mut() else {
                    return Ok(Reply::default());
                };
                let feedback = user.number_game.guess(&input).await;
                Ok(Reply::line(describe_feedback(feedback, user.number_game.state().target())))
            }
            Command::GuessReset => {
                if let Some(user) = self.user.as_mut() {
                    user.number_game.reset();
                }
                Ok(Reply::line("I'm thinking of a number between 1 and 100."))
            }
            Command::Move(cell) => self.play_move(cell).await,
            Command::BoardReset | Command::SessionReset => {
                let Some(user) = self.user.as_mut() else {
                    return Ok(Reply::default());
                };
                if command == Command::SessionReset {
                    user.board_game.new_session();
                } else {
                    user.board_game.reset();
                }
                let mut reply = Reply::line("New game. Your turn (X).");
                reply.push(user.board_game.game().board().to_string());
                Ok(reply)
            }
            Command::Quiz(correct) => match self.accounts.record_quiz(username, correct).await? {
                Some(record) => Ok(Reply::line(format!(
                    "Quiz recorded. Quizzes completed: {}",
                    record.quizzes
                ))),
                None => Ok(Reply::line("Quiz not recorded: no correct answers.")),
            },
            Command::Profile => self.profile(username).await,
            Command::ShowBio => Ok(Reply::line(self.accounts.bio(username).await?)),
            Command::SaveBio(text) => {
                self.accounts.save_bio(username, &text).await?;
                Ok(Reply::line("Bio saved."))
            }
            admin_command => self.execute_admin(username, admin_command).await,
        }
    }

    async fn play_move(&mut self, cell: usize) -> Result<Reply> {
        let delay = self.config.opponent_delay;
        let Some(user) = self.user.as_mut() else {
            return Ok(Reply::default());
        };
        let engine = &mut user.board_game;

        let mut reply = Reply::default();
        if let Err(err) = engine.player_move(cell).await {
            return Ok(Reply::line(describe_move_error(&err)));
        }

        if engine.game().turn() == Some(Side::Opponent) {
            reply.push(engine.game().board().to_string());
            reply.push("AI thinking...");
            // Cosmetic pause only; the engine already refuses player moves
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(err) = engine.opponent_move().await {
                return Ok(Reply::line(describe_move_error(&err)));
            }
        }

        let game = engine.game();
        reply.push(game.board().to_string());
        reply.push(match game.outcome() {
            BoardOutcome::InProgress => "Your turn (X)".to_string(),
            BoardOutcome::PlayerWin => "You win!".to_string(),
            BoardOutcome::OpponentWin => "AI wins!".to_string(),
            BoardOutcome::Draw => "Draw!".to_string(),
        });
        if game.outcome().is_terminal() {
            let tally = game.tally();
            reply.push(format!(
                "Player {} | Draws {} | AI {}",
                tally.player_score,
                tally.draws(),
                tally.opponent_score
            ));
        }
        Ok(reply)
    }

    async fn profile(&self, username: &str) -> Result<Reply> {
        let record = match self.accounts.store().get_record(username).await {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => return Ok(Reply::line("Profile not found.")),
            Err(err) => return Err(err.into()),
        };
        let profile = derive(&record);

        let mut reply = Reply::line(format!("{} - Level {}", record.username, profile.level));
        reply.push(format!(
            "Games {} | Won {} | Win rate {:.1}% | Quizzes {}",
            record.games_played, record.games_won, profile.win_rate, record.quizzes
        ));
        reply.push(format!(
            "XP {}/{} ({} XP needed for Level {})",
            profile.xp_into_level,
            XP_PER_LEVEL,
            profile.xp_to_next_level,
            profile.level + 1
        ));
        for achievement in &profile.achievements {
            reply.push(format!("[x] {} - {}", achievement.title(), achievement.description()));
        }
        Ok(reply)
    }

    async fn execute_admin(&mut self, username: &str, command: Command) -> Result<Reply> {
        if !self.config.is_admin(username) {
            return Ok(Reply::line("Admin access required."));
        }

        match command {
            Command::AdminList(query) => {
                let records = self.admin.list(&query).await?;
                let mut reply = Reply::line(format!("{} user(s)", records.len()));
                for record in records {
                    reply.push(format!(
                        "{:<16} games {:>3} won {:>3} quizzes {:>3} last login {}",
                        record.username,
                        record.games_played,
                        record.games_won,
                        record.quizzes,
                        record.last_login
                    ));
                }
                Ok(reply)
            }
            Command::AdminStats => {
                let stats = self.admin.stats(Utc::now()).await?;
                Ok(Reply::line(format!(
                    "Users {} | Active {} | Games {} | Quizzes {}",
                    stats.total_users, stats.active_users, stats.total_games, stats.total_quizzes
                )))
            }
            Command::AdminExport => Ok(Reply::line(self.admin.export().await?)),
            Command::AdminDelete(target) => match self.admin.delete(&target).await {
                Ok(_) => {
                    if self.current_user() == Some(target.as_str()) {
                        self.user = None;
                    }
                    Ok(Reply::line(format!("Deleted {}.", target)))
                }
                Err(StoreError::NotFound { .. }) => Ok(Reply::line(format!("No user {}.", target))),
                Err(err) => Err(err.into()),
            },
            Command::AdminReset(target) => match self.admin.reset_stats(&target).await {
                Ok(_) => Ok(Reply::line(format!("Reset stats for {}.", target))),
                Err(StoreError::NotFound { .. }) => Ok(Reply::line(format!("No user {}.", target))),
                Err(err) => Err(err.into()),
            },
            _ => Ok(Reply::default()),
        }
    }
}

fn account_failure(err: AccountError) -> Result<Reply> {
    match err {
        AccountError::Store(err) => Err(err.into()),
        other => Ok(Reply::line(other.to_string())),
    }
}

pub fn describe_feedback(feedback: Feedback, target: u32) -> String {
    match feedback {
        Feedback::OutOfRange => "Enter a number between 1-100".to_string(),
        Feedback::Higher => "Higher! Try again...".to_string(),
        Feedback::Lower => "Lower! Try again...".to_string(),
        Feedback::Correct { tries } => format!(
            "Correct! It took you {} tries! The number was {}.",
            tries, target
        ),
        Feedback::AlreadyWon => "You already won. Use guess-reset to play again.".to_string(),
    }
}

fn describe_move_error(err: &MoveError) -> String {
    match err {
        MoveError::GameOver => "Game over. Use board-reset to play again.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse;
    use playground_core::MemoryKeyValueStore;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            opponent_delay: Duration::ZERO,
            ..Config::default()
        }
    }

    fn setup_session() -> PlaygroundSession {
        let store = Arc::new(ScoreStore::new(Arc::new(MemoryKeyValueStore::new())));
        PlaygroundSession::new(test_config(), store)
    }

    async fn run(session: &mut PlaygroundSession, line: &str) -> Reply {
        session.execute(parse(line).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let mut session = setup_session();
        let reply = run(&mut session, "guess 50").await;
        assert_eq!(reply.lines, vec!["Please login or signup first."]);
    }

    #[tokio::test]
    async fn test_signup_logs_in_and_plays() {
        let mut session = setup_session();

        let reply = run(&mut session, "signup ada secret1 secret1").await;
        assert_eq!(reply.lines[1], "Welcome, ada!");
        assert_eq!(session.current_user(), Some("ada"));

        let reply = run(&mut session, "guess abc").await;
        assert_eq!(reply.lines, vec!["Enter a number between 1-100"]);

        let reply = run(&mut session, "move 4").await;
        assert!(reply.lines.iter().any(|line| line == "AI thinking..."));

        let reply = run(&mut session, "move 4").await;
        assert_eq!(reply.lines, vec!["Cell 4 is already taken"]);
    }

    #[tokio::test]
    async fn test_signup_errors_are_replies() {
        let mut session = setup_session();
        let reply = run(&mut session, "signup ada abc abc").await;
        assert_eq!(reply.lines, vec!["Password must be at least 6 characters"]);
        assert_eq!(session.current_user(), None);
    }

    #[tokio::test]
    async fn test_profile_and_quiz() {
        let mut session = setup_session();
        run(&mut session, "signup ada secret1 secret1").await;

        run(&mut session, "quiz 4").await;
        let reply = run(&mut session, "profile").await;
        assert_eq!(reply.lines[0], "ada - Level 1");
        assert!(reply.lines.iter().any(|line| line.contains("Quiz Master")));
    }

    #[tokio::test]
    async fn test_admin_commands_are_gated() {
        let mut session = setup_session();
        run(&mut session, "signup ada secret1 secret1").await;
        let reply = run(&mut session, "admin stats").await;
        assert_eq!(reply.lines, vec!["Admin access required."]);

        run(&mut session, "logout").await;
        run(&mut session, "signup admin secret1 secret1").await;
        let reply = run(&mut session, "admin list --by username").await;
        assert_eq!(reply.lines[0], "2 user(s)");

        let reply = run(&mut session, "admin delete ada").await;
        assert_eq!(reply.lines, vec!["Deleted ada."]);
        let reply = run(&mut session, "admin delete ada").await;
        assert_eq!(reply.lines, vec!["No user ada."]);
    }

    #[tokio::test]
    async fn test_quit() {
        let mut session = setup_session();
        let reply = run(&mut session, "quit").await;
        assert!(reply.quit);
    }
}
