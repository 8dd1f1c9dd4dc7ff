//! SQLite-backed inputs and unlock persistence for the rules engine.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::engine::UnlockedSet;
use super::types::{Achievement, UserAchievement, UserStats};

/// Result of trying to record an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Inserted,
    /// Another session recorded it first. Treated as success.
    AlreadyExists,
}

/// Where the engine's inputs come from and where unlocks go.
pub trait AchievementStore {
    /// The full catalog, ascending by `target_count`.
    fn fetch_catalog(&self) -> Result<Vec<Achievement>>;

    fn fetch_unlocks(&self, user_id: &str) -> Result<Vec<UserAchievement>>;

    fn fetch_unlocked_set(&self, user_id: &str) -> Result<UnlockedSet> {
        Ok(self
            .fetch_unlocks(user_id)?
            .into_iter()
            .map(|u| u.achievement_id)
            .collect())
    }

    /// `None` if the user has never recorded anything.
    fn fetch_stats(&self, user_id: &str) -> Result<Option<UserStats>>;

    fn persist_unlock(&self, user_id: &str, achievement_id: &str) -> Result<UnlockOutcome>;
}

/// [`AchievementStore`] over a borrowed connection.
///
/// `today` is the user's local date; reading stats resets a streak that
/// lapsed before it.
pub struct SqliteAchievementStore<'c> {
    conn: &'c Connection,
    today: NaiveDate,
}

impl<'c> SqliteAchievementStore<'c> {
    pub fn new(conn: &'c Connection, today: NaiveDate) -> Self {
        Self { conn, today }
    }
}

impl AchievementStore for SqliteAchievementStore<'_> {
    fn fetch_catalog(&self) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, icon, achievement_type, target_count \
             FROM achievements ORDER BY target_count ASC, id ASC",
        )?;
        let catalog = stmt
            .query_map([], |row| {
                Ok(Achievement {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    icon: row.get(3)?,
                    achievement_type: row.get(4)?,
                    target_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(catalog)
    }

    fn fetch_unlocks(&self, user_id: &str) -> Result<Vec<UserAchievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, achievement_id, unlocked_at FROM user_achievements \
             WHERE user_id = ?1 ORDER BY unlocked_at ASC",
        )?;
        let unlocks = stmt
            .query_map(params![user_id], |row| {
                Ok(UserAchievement {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    achievement_id: row.get(2)?,
                    unlocked_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(unlocks)
    }

    fn fetch_stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        crate::diary::stats::load_stats(self.conn, user_id, self.today)
    }

    fn persist_unlock(&self, user_id: &str, achievement_id: &str) -> Result<UnlockOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO user_achievements (id, user_id, achievement_id, unlocked_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                uuid::Uuid::now_v7().to_string(),
                user_id,
                achievement_id,
                crate::diary::timestamp(chrono::Utc::now()),
            ],
        )?;
        Ok(if changed == 0 {
            UnlockOutcome::AlreadyExists
        } else {
            UnlockOutcome::Inserted
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::migrations::DEFAULT_CATALOG;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn catalog_is_sorted_by_target() {
        let conn = db::open_memory_database().unwrap();
        let store = SqliteAchievementStore::new(&conn, today());
        let catalog = store.fetch_catalog().unwrap();
        assert_eq!(catalog.len(), DEFAULT_CATALOG.len());
        assert!(catalog
            .windows(2)
            .all(|w| w[0].target_count <= w[1].target_count));
    }

    #[test]
    fn persist_unlock_is_idempotent() {
        let conn = db::open_memory_database().unwrap();
        let store = SqliteAchievementStore::new(&conn, today());

        assert_eq!(
            store.persist_unlock("me", "first_entry").unwrap(),
            UnlockOutcome::Inserted
        );
        assert_eq!(
            store.persist_unlock("me", "first_entry").unwrap(),
            UnlockOutcome::AlreadyExists
        );
        // Other users are independent
        assert_eq!(
            store.persist_unlock("you", "first_entry").unwrap(),
            UnlockOutcome::Inserted
        );

        let set = store.fetch_unlocked_set("me").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("first_entry"));
    }

    #[test]
    fn unknown_achievement_id_fails_to_persist() {
        let conn = db::open_memory_database().unwrap();
        let store = SqliteAchievementStore::new(&conn, today());
        assert!(store.persist_unlock("me", "no_such_achievement").is_err());
    }

    #[test]
    fn stats_absent_for_new_user() {
        let conn = db::open_memory_database().unwrap();
        let store = SqliteAchievementStore::new(&conn, today());
        assert!(store.fetch_stats("nobody").unwrap().is_none());
    }
}
