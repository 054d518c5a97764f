use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::debug;

use crate::entities::{kv_entries, prelude::*};
use playground_core::KeyValueStore;

/// `KeyValueStore` backed by the `kv_entries` table.
pub struct SqliteKeyValueStore {
    db: DatabaseConnection,
}

impl SqliteKeyValueStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let entries = KvEntries::find().all(&self.db).await?;
        Ok(entries.into_iter().map(|entry| entry.key).collect())
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = KvEntries::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = kv_entries::ActiveModel {
            key: sea_orm::ActiveValue::Set(key.to_string()),
            value: sea_orm::ActiveValue::Set(value.to_string()),
            updated_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        KvEntries::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        KvEntries::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use playground_core::{ScoreStore, USERS_KEY};
    use playground_types::UserRecord;
    use std::sync::Arc;

    async fn setup_test_db() -> SqliteKeyValueStore {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SqliteKeyValueStore::new(db)
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = setup_test_db().await;

        assert_eq!(store.get("user_bio_ada").await.unwrap(), None);

        store.set("user_bio_ada", "first").await.unwrap();
        store.set("user_bio_ada", "second").await.unwrap();
        assert_eq!(
            store.get("user_bio_ada").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(store.keys().await.unwrap(), vec!["user_bio_ada".to_string()]);

        store.remove("user_bio_ada").await.unwrap();
        assert_eq!(store.get("user_bio_ada").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_score_store_round_trip_through_sqlite() {
        let backend = Arc::new(setup_test_db().await);
        let store = ScoreStore::new(backend.clone());

        store
            .insert_record(UserRecord::new("ada", "h", None, "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .update_record("ada", |record| {
                record.games_played += 1;
                record.games_won += 1;
            })
            .await
            .unwrap();

        // A second store over the same table sees the flushed document
        let reopened = ScoreStore::new(backend.clone());
        let record = reopened.get_record("ada").await.unwrap();
        assert_eq!((record.games_played, record.games_won), (1, 1));

        let document = backend.get(USERS_KEY).await.unwrap().unwrap();
        assert!(document.contains("\"gamesPlayed\":1"));
    }
}
