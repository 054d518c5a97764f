use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A stored user: credentials plus the raw game and quiz counters.
///
/// Field names follow the JSON document the browser front-end writes, so
/// records produced by either side deserialize into the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserRecord {
    pub username: String,
    #[serde(rename = "hash")]
    pub credential_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub games_won: u32,
    #[serde(default)]
    pub quizzes: u32,
    #[serde(default)]
    pub last_login: String, // ISO 8601 string
    #[serde(default)]
    pub created_at: String, // ISO 8601 string
}

impl UserRecord {
    /// A freshly signed-up user with every counter at zero.
    pub fn new(
        username: impl Into<String>,
        credential_hash: impl Into<String>,
        email: Option<String>,
        now: &str,
    ) -> Self {
        Self {
            username: username.into(),
            credential_hash: credential_hash.into(),
            email,
            games_played: 0,
            games_won: 0,
            quizzes: 0,
            last_login: now.to_string(),
            created_at: now.to_string(),
        }
    }
}

/// Display metrics computed from a [`UserRecord`]. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DerivedProfile {
    pub win_rate: f64, // percentage, 0-100
    #[ts(type = "number")]
    pub xp: u64,
    #[ts(type = "number")]
    pub level: u64,
    #[ts(type = "number")]
    pub xp_into_level: u64,
    #[ts(type = "number")]
    pub xp_for_next_level: u64,
    #[ts(type = "number")]
    pub xp_to_next_level: u64,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Achievement {
    FirstGame,         // at least one game played
    QuizMaster,        // at least one quiz completed
    CompetitivePlayer, // win rate of 50% or more
    VeteranPlayer,     // ten or more games played
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FirstGame,
        Achievement::QuizMaster,
        Achievement::CompetitivePlayer,
        Achievement::VeteranPlayer,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstGame => "First Game",
            Achievement::QuizMaster => "Quiz Master",
            Achievement::CompetitivePlayer => "Competitive Player",
            Achievement::VeteranPlayer => "Veteran Player",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstGame => "Play your first game",
            Achievement::QuizMaster => "Complete your first quiz",
            Achievement::CompetitivePlayer => "Achieve 50% win rate",
            Achievement::VeteranPlayer => "Play 10+ games",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_front_end_field_names() {
        let record = UserRecord::new("ada", "abc123", None, "2026-01-01T00:00:00+00:00");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["hash"], "abc123");
        assert_eq!(json["gamesPlayed"], 0);
        assert_eq!(json["lastLogin"], "2026-01-01T00:00:00+00:00");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let json = r#"{"username":"grace","hash":"ff","lastLogin":"2026-01-01T00:00:00Z"}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.games_played, 0);
        assert_eq!(record.games_won, 0);
        assert_eq!(record.quizzes, 0);
        assert_eq!(record.created_at, "");
    }
}
