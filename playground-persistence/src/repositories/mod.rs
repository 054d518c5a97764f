pub mod kv_repository;

pub use kv_repository::SqliteKeyValueStore;
