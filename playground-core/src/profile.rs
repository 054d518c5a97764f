use playground_types::{Achievement, DerivedProfile, UserRecord};

pub const XP_PER_GAME: u64 = 10;
pub const XP_PER_QUIZ: u64 = 20;
pub const XP_PER_WIN: u64 = 30;
pub const XP_PER_LEVEL: u64 = 100;

/// Percentage of played games that were won; 0 when nothing was played.
pub fn win_rate(games_played: u32, games_won: u32) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    games_won as f64 / games_played as f64 * 100.0
}

/// Computed in u64 so any combination of u32 counters fits.
pub fn experience(record: &UserRecord) -> u64 {
    u64::from(record.games_played) * XP_PER_GAME
        + u64::from(record.quizzes) * XP_PER_QUIZ
        + u64::from(record.games_won) * XP_PER_WIN
}

pub fn achievements(record: &UserRecord) -> Vec<Achievement> {
    let rate = win_rate(record.games_played, record.games_won);

    Achievement::ALL
        .into_iter()
        .filter(|achievement| match achievement {
            Achievement::FirstGame => record.games_played >= 1,
            Achievement::QuizMaster => record.quizzes >= 1,
            Achievement::CompetitivePlayer => rate >= 50.0,
            Achievement::VeteranPlayer => record.games_played >= 10,
        })
        .collect()
}

/// Compute the display profile for a record.
pub fn derive(record: &UserRecord) -> DerivedProfile {
    let xp = experience(record);
    let level = xp / XP_PER_LEVEL + 1;
    let xp_for_next_level = level * XP_PER_LEVEL;

    DerivedProfile {
        win_rate: win_rate(record.games_played, record.games_won),
        xp,
        level,
        xp_into_level: xp % XP_PER_LEVEL,
        xp_for_next_level,
        xp_to_next_level: xp_for_next_level - xp,
        achievements: achievements(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(games_played: u32, games_won: u32, quizzes: u32) -> UserRecord {
        UserRecord {
            games_played,
            games_won,
            quizzes,
            ..UserRecord::new("ada", "h", None, "2026-01-01T00:00:00Z")
        }
    }

    #[test]
    fn test_derive_reference_profile() {
        let profile = derive(&record_with(10, 7, 5));

        assert_eq!(profile.xp, 410);
        assert_eq!(profile.level, 5);
        assert_eq!(profile.xp_into_level, 10);
        assert_eq!(profile.xp_for_next_level, 500);
        assert_eq!(profile.xp_to_next_level, 90);
        assert!((profile.win_rate - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fresh_record_is_level_one() {
        let profile = derive(&record_with(0, 0, 0));

        assert_eq!(profile.xp, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp_for_next_level, 100);
        assert_eq!(profile.win_rate, 0.0);
        assert!(profile.achievements.is_empty());
    }

    #[test]
    fn test_exact_level_boundary() {
        // 10 games, no wins -> exactly 100 xp
        let profile = derive(&record_with(10, 0, 0));
        assert_eq!(profile.level, 2);
        assert_eq!(profile.xp_into_level, 0);
        assert_eq!(profile.xp_to_next_level, 100);
    }

    #[test]
    fn test_max_counters_do_not_overflow() {
        let profile = derive(&record_with(u32::MAX, u32::MAX, u32::MAX));
        let max = u64::from(u32::MAX);

        assert_eq!(profile.xp, max * 60);
        assert_eq!(profile.level, max * 60 / 100 + 1);
        assert_eq!(profile.xp_to_next_level, 100 - profile.xp_into_level);
        assert_eq!(profile.win_rate, 100.0);
    }

    #[test]
    fn test_achievements_unlock_by_threshold() {
        assert_eq!(achievements(&record_with(1, 0, 0)), vec![Achievement::FirstGame]);
        assert_eq!(
            achievements(&record_with(2, 1, 1)),
            vec![
                Achievement::FirstGame,
                Achievement::QuizMaster,
                Achievement::CompetitivePlayer
            ]
        );
        assert!(achievements(&record_with(10, 0, 0)).contains(&Achievement::VeteranPlayer));
        assert!(!achievements(&record_with(9, 4, 0)).contains(&Achievement::CompetitivePlayer));
    }
}
