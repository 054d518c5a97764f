use crate::{KeyValueStore, ScoreRecorder, ScoreStore, StoreError};
use chrono::Utc;
use playground_types::UserRecord;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_BIO: &str =
    "C programming enthusiast. Love solving problems and building things!";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Username must not be empty")]
    EmptyUsername,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {min_length} characters")]
    PasswordTooShort { min_length: usize },
    #[error("Username already exists: {username}")]
    UsernameTaken { username: String },
    #[error("User not found: {username}")]
    UserNotFound { username: String },
    #[error("Invalid password")]
    InvalidPassword,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: Option<String>,
}

/// Lowercase hex SHA-256 of the password, as stored in `UserRecord::credential_hash`.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Storage key of a user's freeform bio.
pub fn bio_key(username: &str) -> String {
    format!("user_bio_{}", username)
}

pub struct AccountService {
    store: Arc<ScoreStore>,
}

impl AccountService {
    pub fn new(store: Arc<ScoreStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ScoreStore> {
        &self.store
    }

    fn backend(&self) -> &Arc<dyn KeyValueStore> {
        self.store.backend()
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserRecord, AccountError> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::EmptyUsername);
        }
        if request.password != request.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AccountError::PasswordTooShort {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        let email = request.email.filter(|email| !email.trim().is_empty());
        let now = Utc::now().to_rfc3339();
        let record = UserRecord::new(username, hash_password(&request.password), email, &now);

        match self.store.insert_record(record).await {
            Ok(record) => {
                info!("Created account {}", record.username);
                Ok(record)
            }
            Err(StoreError::AlreadyExists { username }) => {
                Err(AccountError::UsernameTaken { username })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Check the password and stamp `last_login`.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord, AccountError> {
        let username = username.trim();
        let record = match self.store.get_record(username).await {
            Ok(record) => record,
            Err(StoreError::NotFound { username }) => {
                return Err(AccountError::UserNotFound { username });
            }
            Err(err) => return Err(err.into()),
        };

        if record.credential_hash != hash_password(password) {
            warn!("Rejected login for {}", username);
            return Err(AccountError::InvalidPassword);
        }

        let now = Utc::now().to_rfc3339();
        let record = self
            .store
            .update_record(username, |record| record.last_login = now)
            .await?;

        info!("{} logged in", username);
        Ok(record)
    }

    /// Count a submitted quiz. Only submissions with a correct answer count.
    ///
    /// Returns `Ok(None)` when nothing was recorded, including for unknown users.
    pub async fn record_quiz(
        &self,
        username: &str,
        correct_answers: u32,
    ) -> Result<Option<UserRecord>, StoreError> {
        if correct_answers == 0 {
            return Ok(None);
        }

        match self
            .store
            .update_record(username, |record| record.quizzes += 1)
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound { username }) => {
                warn!("Quiz submitted for unknown user {}, not recorded", username);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn bio(&self, username: &str) -> Result<String, StoreError> {
        let bio = self.backend().get(&bio_key(username)).await?;
        Ok(bio.unwrap_or_else(|| DEFAULT_BIO.to_string()))
    }

    pub async fn save_bio(&self, username: &str, bio: &str) -> Result<(), StoreError> {
        self.backend().set(&bio_key(username), bio).await?;
        Ok(())
    }

    /// Score hook for the games played by `username`.
    pub fn recorder_for(&self, username: &str) -> ScoreRecorder {
        ScoreRecorder::new(self.store.clone(), username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryKeyValueStore;

    fn setup_service() -> AccountService {
        let store = ScoreStore::new(Arc::new(MemoryKeyValueStore::new()));
        AccountService::new(Arc::new(store))
    }

    fn request(username: &str, password: &str, confirm: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            email: None,
        }
    }

    #[test]
    fn test_hash_password_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(bio_key("ada"), "user_bio_ada");
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let service = setup_service();

        let created = service
            .signup(request("ada", "secret1", "secret1"))
            .await
            .unwrap();
        assert_eq!(created.games_played, 0);
        assert_eq!(created.credential_hash, hash_password("secret1"));
        assert_eq!(created.created_at, created.last_login);

        let logged_in = service.login("ada", "secret1").await.unwrap();
        assert_eq!(logged_in.username, "ada");
    }

    #[tokio::test]
    async fn test_signup_validation_order() {
        let service = setup_service();

        assert!(matches!(
            service.signup(request("  ", "secret1", "secret1")).await,
            Err(AccountError::EmptyUsername)
        ));
        assert!(matches!(
            service.signup(request("ada", "secret1", "secret2")).await,
            Err(AccountError::PasswordMismatch)
        ));
        assert!(matches!(
            service.signup(request("ada", "short", "short")).await,
            Err(AccountError::PasswordTooShort { min_length: 6 })
        ));

        service
            .signup(request("ada", "secret1", "secret1"))
            .await
            .unwrap();
        assert!(matches!(
            service.signup(request("ada", "other12", "other12")).await,
            Err(AccountError::UsernameTaken { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = setup_service();
        service
            .signup(request("ada", "secret1", "secret1"))
            .await
            .unwrap();

        assert!(matches!(
            service.login("bob", "secret1").await,
            Err(AccountError::UserNotFound { .. })
        ));
        assert!(matches!(
            service.login("ada", "wrong-password").await,
            Err(AccountError::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn test_login_trims_username_like_signup() {
        let service = setup_service();
        service
            .signup(request("ada ", "secret1", "secret1"))
            .await
            .unwrap();

        let record = service.login("ada ", "secret1").await.unwrap();
        assert_eq!(record.username, "ada");
    }

    #[tokio::test]
    async fn test_legacy_record_can_log_in_and_play() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let document = format!(
            r#"[{{"username":"old","hash":"{}","gamesWon":2}}]"#,
            hash_password("secret1")
        );
        backend.set(crate::USERS_KEY, &document).await.unwrap();
        let service = AccountService::new(Arc::new(ScoreStore::new(backend)));

        let record = service.login("old", "secret1").await.unwrap();
        assert_ne!(record.last_login, "");

        let record = service.recorder_for("old").record_game(true).await.unwrap();
        assert_eq!(record.games_played, 1);
    }

    #[tokio::test]
    async fn test_quiz_needs_a_correct_answer() {
        let service = setup_service();
        service
            .signup(request("ada", "secret1", "secret1"))
            .await
            .unwrap();

        assert!(service.record_quiz("ada", 0).await.unwrap().is_none());
        let record = service.record_quiz("ada", 3).await.unwrap().unwrap();
        assert_eq!(record.quizzes, 1);

        // Unknown users are ignored rather than failing
        assert!(service.record_quiz("ghost", 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bio_defaults_and_saves() {
        let service = setup_service();

        assert_eq!(service.bio("ada").await.unwrap(), DEFAULT_BIO);
        service.save_bio("ada", "Writes parsers").await.unwrap();
        assert_eq!(service.bio("ada").await.unwrap(), "Writes parsers");
    }
}
