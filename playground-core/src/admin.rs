use crate::{ScoreStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use playground_types::UserRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;

/// Users who logged in within this many days count as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    Username,
    GamesPlayed,
    LastLogin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_games: u64,
    pub total_quizzes: u64,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn matches_search(record: &UserRecord, needle: &str) -> bool {
    record.username.to_lowercase().contains(needle)
        || record
            .email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(needle))
}

fn compare(a: &UserRecord, b: &UserRecord, field: SortField) -> Ordering {
    match field {
        SortField::Username => a.username.to_lowercase().cmp(&b.username.to_lowercase()),
        SortField::GamesPlayed => a.games_played.cmp(&b.games_played),
        // Unparseable timestamps sort as the oldest
        SortField::LastLogin => parse_timestamp(&a.last_login).cmp(&parse_timestamp(&b.last_login)),
    }
}

/// Record management for the admin view.
pub struct AdminService {
    store: Arc<ScoreStore>,
}

impl AdminService {
    pub fn new(store: Arc<ScoreStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Vec<UserRecord>, StoreError> {
        let mut records = self.store.records().await?;

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            records.retain(|record| matches_search(record, &needle));
        }

        records.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort_by);
            match query.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        Ok(records)
    }

    pub async fn delete(&self, username: &str) -> Result<UserRecord, StoreError> {
        let removed = self.store.remove_record(username).await?;
        info!("Admin deleted user {}", username);
        Ok(removed)
    }

    /// Zero a user's game and quiz counters.
    pub async fn reset_stats(&self, username: &str) -> Result<UserRecord, StoreError> {
        let record = self
            .store
            .update_record(username, |record| {
                record.games_played = 0;
                record.games_won = 0;
                record.quizzes = 0;
            })
            .await?;
        info!("Admin reset stats for {}", username);
        Ok(record)
    }

    /// Pretty-printed JSON of the whole collection.
    pub async fn export(&self) -> Result<String, StoreError> {
        let records = self.store.records().await?;
        serde_json::to_string_pretty(&records).map_err(|err| StoreError::Backend(err.into()))
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<AdminStats, StoreError> {
        let records = self.store.records().await?;
        let cutoff = now - Duration::days(ACTIVE_WINDOW_DAYS);

        Ok(AdminStats {
            total_users: records.len(),
            active_users: records
                .iter()
                .filter(|record| parse_timestamp(&record.last_login).is_some_and(|at| at > cutoff))
                .count(),
            total_games: records.iter().map(|r| r.games_played as u64).sum(),
            total_quizzes: records.iter().map(|r| r.quizzes as u64).sum(),
        })
    }
}
