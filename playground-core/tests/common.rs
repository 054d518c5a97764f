#![allow(dead_code)]

use playground_core::{
    AccountService, GameEvent, GameEventHandler, MemoryKeyValueStore, NumberGuessEngine,
    ScoreStore, SignupRequest, TicTacToeEngine,
};
use playground_types::UserRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

pub const TEST_PASSWORD: &str = "hunter22";

/// Score store over a fresh in-memory backend
pub fn create_test_store() -> Arc<ScoreStore> {
    Arc::new(ScoreStore::new(Arc::new(MemoryKeyValueStore::new())))
}

/// Account service with a signed-up user named `username`
pub async fn create_test_accounts(username: &str) -> AccountService {
    let accounts = AccountService::new(create_test_store());
    accounts
        .signup(SignupRequest {
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            confirm_password: TEST_PASSWORD.to_string(),
            email: Some(format!("{}@test.com", username)),
        })
        .await
        .unwrap();
    accounts
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn create_number_engine(accounts: &AccountService, username: &str) -> NumberGuessEngine<StdRng> {
    NumberGuessEngine::with_rng(accounts.recorder_for(username), seeded_rng(1))
}

pub fn create_board_engine(accounts: &AccountService, username: &str) -> TicTacToeEngine<StdRng> {
    TicTacToeEngine::with_rng(accounts.recorder_for(username), seeded_rng(2))
}

pub async fn fetch_record(accounts: &AccountService, username: &str) -> UserRecord {
    accounts.store().get_record(username).await.unwrap()
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, check_fn: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| check_fn(e)).count()
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}
