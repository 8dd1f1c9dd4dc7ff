//! SQL DDL for all murmur tables.
//!
//! Defines `voice_entries`, `diary_events`, `achievements`,
//! `user_achievements`, `user_stats`, `user_tokens` and `schema_meta`. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for murmur's core tables.
const SCHEMA_SQL: &str = r#"
-- Recorded voice notes
CREATE TABLE IF NOT EXISTS voice_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    audio_url TEXT,
    transcript TEXT,
    summary TEXT,
    duration INTEGER NOT NULL DEFAULT 0 CHECK(duration >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_user_created ON voice_entries(user_id, created_at);

-- Events extracted from entries
CREATE TABLE IF NOT EXISTS diary_events (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    entry_id TEXT REFERENCES voice_entries(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    description TEXT,
    event_date TEXT NOT NULL,
    reminded INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_user_date ON diary_events(user_id, event_date);

-- Achievement catalog (seeded, read-only at runtime)
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    achievement_type TEXT NOT NULL,
    target_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

-- Append-only unlock records
CREATE TABLE IF NOT EXISTS user_achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL REFERENCES achievements(id),
    unlocked_at TEXT NOT NULL,
    UNIQUE(user_id, achievement_id)
);

-- Aggregate counters, one row per user
CREATE TABLE IF NOT EXISTS user_stats (
    user_id TEXT PRIMARY KEY,
    total_entries INTEGER NOT NULL DEFAULT 0,
    total_events INTEGER NOT NULL DEFAULT 0,
    total_questions INTEGER NOT NULL DEFAULT 0,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_entry_date TEXT,
    updated_at TEXT NOT NULL
);

-- Bearer tokens for the HTTP API
CREATE TABLE IF NOT EXISTS user_tokens (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for expected in [
            "achievements",
            "diary_events",
            "schema_meta",
            "user_achievements",
            "user_stats",
            "user_tokens",
            "voice_entries",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn unlock_pairs_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO achievements (id, name, description, icon, achievement_type, target_count, created_at) \
             VALUES ('a', 'A', 'd', 'i', 'entries', 1, '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO user_achievements (id, user_id, achievement_id, unlocked_at) VALUES ('1', 'u', 'a', 'now')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO user_achievements (id, user_id, achievement_id, unlocked_at) VALUES ('2', 'u', 'a', 'now')",
            [],
        );
        assert!(dup.is_err());
    }
}
