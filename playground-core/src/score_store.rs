use crate::KeyValueStore;
use playground_types::UserRecord;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Key under which the whole user collection is stored as one JSON array.
pub const USERS_KEY: &str = "cplayground_users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found: {username}")]
    NotFound { username: String },
    #[error("User already exists: {username}")]
    AlreadyExists { username: String },
    #[error("Update for {username} would leave games won ({won}) above games played ({played})")]
    WinsExceedGames {
        username: String,
        won: u32,
        played: u32,
    },
    #[error("Stored user collection is malformed: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("Key-value backend failed: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Owner of the persisted user collection.
///
/// The collection is loaded once into memory and every mutation goes through
/// a single lock held across read, modify and flush, so updates issued back to
/// back are applied in order and none is lost. Each successful mutation
/// rewrites the full document under [`USERS_KEY`].
pub struct ScoreStore {
    backend: Arc<dyn KeyValueStore>,
    records: Mutex<Option<Vec<UserRecord>>>,
}

impl ScoreStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            records: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub async fn get_record(&self, username: &str) -> Result<UserRecord, StoreError> {
        let mut cached = self.records.lock().await;
        let records = self.load(&mut cached).await?;

        records
            .iter()
            .find(|record| record.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                username: username.to_string(),
            })
    }

    /// Apply `mutator` to the record for `username` and persist the collection.
    ///
    /// The mutator runs on a copy; if it pushes `games_won` further above
    /// `games_played` or the flush fails, the in-memory collection keeps its
    /// previous value. Records already loaded with more wins than games stay
    /// updatable as long as the excess does not grow.
    pub async fn update_record<F>(&self, username: &str, mutator: F) -> Result<UserRecord, StoreError>
    where
        F: FnOnce(&mut UserRecord) + Send,
    {
        let mut cached = self.records.lock().await;
        let records = self.load(&mut cached).await?;

        let index = records
            .iter()
            .position(|record| record.username == username)
            .ok_or_else(|| StoreError::NotFound {
                username: username.to_string(),
            })?;

        let mut updated = records[index].clone();
        mutator(&mut updated);

        if excess_wins(&updated) > excess_wins(&records[index]) {
            return Err(StoreError::WinsExceedGames {
                username: username.to_string(),
                won: updated.games_won,
                played: updated.games_played,
            });
        }

        let previous = std::mem::replace(&mut records[index], updated.clone());
        if let Err(err) = self.flush(records).await {
            records[index] = previous;
            return Err(err);
        }

        debug!("Updated record for {}", username);
        Ok(updated)
    }

    /// Append a new record. Usernames are unique.
    pub async fn insert_record(&self, record: UserRecord) -> Result<UserRecord, StoreError> {
        let mut cached = self.records.lock().await;
        let records = self.load(&mut cached).await?;

        if records.iter().any(|existing| existing.username == record.username) {
            return Err(StoreError::AlreadyExists {
                username: record.username,
            });
        }

        records.push(record.clone());
        if let Err(err) = self.flush(records).await {
            records.pop();
            return Err(err);
        }

        debug!("Inserted record for {}", record.username);
        Ok(record)
    }

    pub async fn remove_record(&self, username: &str) -> Result<UserRecord, StoreError> {
        let mut cached = self.records.lock().await;
        let records = self.load(&mut cached).await?;

        let index = records
            .iter()
            .position(|record| record.username == username)
            .ok_or_else(|| StoreError::NotFound {
                username: username.to_string(),
            })?;

        let removed = records.remove(index);
        if let Err(err) = self.flush(records).await {
            records.insert(index, removed);
            return Err(err);
        }

        debug!("Removed record for {}", username);
        Ok(removed)
    }

    /// Snapshot of every record in stored order.
    pub async fn records(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut cached = self.records.lock().await;
        Ok(self.load(&mut cached).await?.clone())
    }

    /// Drop the in-memory copy so the next access re-reads the backend.
    pub async fn reload(&self) {
        *self.records.lock().await = None;
    }

    async fn load<'a>(
        &self,
        cached: &'a mut Option<Vec<UserRecord>>,
    ) -> Result<&'a mut Vec<UserRecord>, StoreError> {
        if cached.is_none() {
            let records = match self.backend.get(USERS_KEY).await? {
                Some(document) => serde_json::from_str(&document).map_err(StoreError::Corrupt)?,
                None => Vec::new(),
            };
            *cached = Some(records);
        }

        Ok(cached.get_or_insert_with(Vec::new))
    }

    async fn flush(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let document =
            serde_json::to_string(records).map_err(|err| StoreError::Backend(err.into()))?;
        self.backend.set(USERS_KEY, &document).await?;
        Ok(())
    }
}

fn excess_wins(record: &UserRecord) -> u32 {
    record.games_won.saturating_sub(record.games_played)
}

/// The one place finished games reach the store.
///
/// Both engines call [`ScoreRecorder::record_game`] on their terminal
/// transition and nowhere else. A missing user is a silent no-op.
#[derive(Clone)]
pub struct ScoreRecorder {
    store: Arc<ScoreStore>,
    username: String,
}

impl ScoreRecorder {
    pub fn new(store: Arc<ScoreStore>, username: impl Into<String>) -> Self {
        Self {
            store,
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Count one finished game, and one win when `won`.
    ///
    /// Returns the updated record, or `None` when the user is unknown or the
    /// backend refused the write (logged, never propagated to the game).
    pub async fn record_game(&self, won: bool) -> Option<UserRecord> {
        let result = self
            .store
            .update_record(&self.username, |record| {
                record.games_played += 1;
                if won {
                    record.games_won += 1;
                }
            })
            .await;

        match result {
            Ok(record) => Some(record),
            Err(StoreError::NotFound { username }) => {
                warn!("Finished game for unknown user {}, not recorded", username);
                None
            }
            Err(err) => {
                error!("Failed to record game for {}: {}", self.username, err);
                None
            }
        }
    }
}
