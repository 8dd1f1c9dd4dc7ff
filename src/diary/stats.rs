//! Per-user counters in `user_stats`.
//!
//! Every write is a single upsert so a missing row is created on first use.
//! Streaks are kept in step with `last_entry_date` on write and lapse on read.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::achievements::types::UserStats;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Streak after recording an entry on `day`.
pub fn next_streak(last_entry: Option<NaiveDate>, current: u32, day: NaiveDate) -> u32 {
    match last_entry {
        Some(last) if last == day => current.max(1),
        Some(last) if last.succ_opt() == Some(day) => current + 1,
        // Clock skew: an entry dated before the last one leaves the run alone
        Some(last) if last > day => current.max(1),
        _ => 1,
    }
}

/// Count one entry on local `day` and advance the streak.
pub fn record_entry_day(conn: &Connection, user_id: &str, day: NaiveDate) -> Result<UserStats> {
    let row: Option<(Option<String>, u32, u32)> = conn
        .query_row(
            "SELECT last_entry_date, current_streak, longest_streak FROM user_stats WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let (last, current, longest) = match row {
        Some((last, current, longest)) => {
            let last = last.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok());
            (last, current, longest)
        }
        None => (None, 0, 0),
    };

    let streak = next_streak(last, current, day);
    let longest = longest.max(streak);
    let last_day = match last {
        Some(l) if l > day => l,
        _ => day,
    };

    conn.execute(
        "INSERT INTO user_stats (user_id, total_entries, current_streak, longest_streak, last_entry_date, updated_at) \
         VALUES (?1, 1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(user_id) DO UPDATE SET \
             total_entries = total_entries + 1, \
             current_streak = excluded.current_streak, \
             longest_streak = excluded.longest_streak, \
             last_entry_date = excluded.last_entry_date, \
             updated_at = excluded.updated_at",
        params![
            user_id,
            streak,
            longest,
            last_day.format(DATE_FORMAT).to_string(),
            super::timestamp(chrono::Utc::now()),
        ],
    )?;

    tracing::debug!(user = %user_id, streak, longest, "entry counted");
    read_stats(conn, user_id).map(Option::unwrap_or_default)
}

/// Add `count` extracted events to the user's total.
pub fn add_events(conn: &Connection, user_id: &str, count: u32) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO user_stats (user_id, total_events, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id) DO UPDATE SET \
             total_events = total_events + excluded.total_events, \
             updated_at = excluded.updated_at",
        params![user_id, count, super::timestamp(chrono::Utc::now())],
    )?;
    Ok(())
}

/// Count one answered question. This is the only write path for
/// `total_questions`.
pub fn increment_questions(conn: &Connection, user_id: &str) -> Result<u32> {
    let total: u32 = conn.query_row(
        "INSERT INTO user_stats (user_id, total_questions, updated_at) VALUES (?1, 1, ?2) \
         ON CONFLICT(user_id) DO UPDATE SET \
             total_questions = total_questions + 1, \
             updated_at = excluded.updated_at \
         RETURNING total_questions",
        params![user_id, super::timestamp(chrono::Utc::now())],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Stats as of local `today`, lapsing a streak whose last entry was before
/// yesterday. `None` if the user has no row.
pub fn load_stats(conn: &Connection, user_id: &str, today: NaiveDate) -> Result<Option<UserStats>> {
    if let Some(yesterday) = today.pred_opt() {
        let lapsed = conn.execute(
            "UPDATE user_stats SET current_streak = 0, updated_at = ?1 \
             WHERE user_id = ?2 AND current_streak > 0 \
               AND last_entry_date IS NOT NULL AND last_entry_date < ?3",
            params![
                super::timestamp(chrono::Utc::now()),
                user_id,
                yesterday.format(DATE_FORMAT).to_string(),
            ],
        )?;
        if lapsed > 0 {
            tracing::info!(user = %user_id, "streak lapsed");
        }
    }
    read_stats(conn, user_id)
}

fn read_stats(conn: &Connection, user_id: &str) -> Result<Option<UserStats>> {
    let stats = conn
        .query_row(
            "SELECT total_entries, total_events, total_questions, current_streak, longest_streak \
             FROM user_stats WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserStats {
                    total_entries: row.get(0)?,
                    total_events: row.get(1)?,
                    total_questions: row.get(2)?,
                    current_streak: row.get(3)?,
                    longest_streak: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(stats)
}
