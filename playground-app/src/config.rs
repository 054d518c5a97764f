use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use playground_persistence::DEFAULT_DATABASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Pause before the opponent's reply is shown. Presentation only.
    pub opponent_delay: Duration,
    pub admin_users: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let opponent_delay_ms: u64 = env::var("OPPONENT_DELAY_MS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("Invalid OPPONENT_DELAY_MS")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            opponent_delay: Duration::from_millis(opponent_delay_ms),
            admin_users: parse_admin_users(
                &env::var("ADMIN_USERS").unwrap_or_else(|_| "admin".to_string()),
            ),
        })
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_users.iter().any(|admin| admin == username)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            opponent_delay: Duration::from_millis(500),
            admin_users: vec!["admin".to_string()],
        }
    }
}

fn parse_admin_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
