//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::{params, Connection};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Achievement catalog seeded by migration v2:
/// `(id, name, description, icon, achievement_type, target_count)`.
pub const DEFAULT_CATALOG: &[(&str, &str, &str, &str, &str, i64)] = &[
    ("first_entry", "First Words", "Record your first voice note", "🎙️", "entries", 1),
    ("first_event", "Planner", "Get your first event extracted from a note", "📅", "events", 1),
    ("first_question", "Curious Mind", "Ask your diary a question", "❓", "questions", 1),
    ("streak_3", "On a Roll", "Record notes three days in a row", "🔥", "streak", 3),
    ("streak_7", "Full Week", "Record notes seven days in a row", "🗓️", "streak", 7),
    ("entries_10", "Storyteller", "Record ten voice notes", "📔", "entries", 10),
    ("events_10", "Busy Calendar", "Collect ten events", "📌", "events", 10),
    ("questions_10", "Inquisitive", "Ask ten questions", "🔍", "questions", 10),
    ("streak_30", "Habit Formed", "Record notes thirty days in a row", "🏆", "streak", 30),
    ("entries_50", "Chronicler", "Record fifty voice notes", "📚", "entries", 50),
    ("entries_100", "Centurion", "Record one hundred voice notes", "💯", "entries", 100),
];

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            3 => migrate_v2_to_v3(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: seed the achievement catalog.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO achievements (id, name, description, icon, achievement_type, target_count, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (id, name, description, icon, kind, target) in DEFAULT_CATALOG {
        stmt.execute(params![id, name, description, icon, kind, target, now])?;
    }
    Ok(())
}

/// Migration v2 → v3: per-event reminder lead time.
fn migrate_v2_to_v3(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "ALTER TABLE diary_events ADD COLUMN reminder_minutes INTEGER NOT NULL DEFAULT 60",
        [],
    )?;
    Ok(())
}
