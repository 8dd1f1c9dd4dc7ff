//! Write and read paths for voice entries.
//!
//! [`record_entry`] inserts the entry and counts it towards the user's stats
//! in one transaction, so `total_entries` never drifts from the table.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::VoiceEntry;
use super::{day_bounds, local_day, stats, timestamp};

const ENTRY_COLUMNS: &str =
    "id, user_id, audio_url, transcript, summary, duration, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<VoiceEntry> {
    Ok(VoiceEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        audio_url: row.get(2)?,
        transcript: row.get(3)?,
        summary: row.get(4)?,
        duration: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Store a transcribed note recorded now.
pub fn record_entry(
    conn: &mut Connection,
    user_id: &str,
    transcript: &str,
    duration_secs: f64,
    offset: FixedOffset,
) -> Result<VoiceEntry> {
    record_entry_at(conn, user_id, transcript, duration_secs, Utc::now(), offset)
}

/// Store a transcribed note with an explicit creation time.
pub fn record_entry_at(
    conn: &mut Connection,
    user_id: &str,
    transcript: &str,
    duration_secs: f64,
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<VoiceEntry> {
    if transcript.trim().is_empty() {
        bail!("transcript must not be empty");
    }
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        bail!("duration must be a non-negative number of seconds");
    }

    let entry = VoiceEntry {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        audio_url: None,
        transcript: Some(transcript.to_string()),
        summary: None,
        duration: duration_secs.round() as i64,
        created_at: timestamp(at),
        updated_at: timestamp(at),
    };

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO voice_entries (id, user_id, audio_url, transcript, summary, duration, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id,
            entry.user_id,
            entry.audio_url,
            entry.transcript,
            entry.summary,
            entry.duration,
            entry.created_at,
            entry.updated_at,
        ],
    )?;
    stats::record_entry_day(&tx, user_id, local_day(at, offset))?;
    tx.commit()?;

    tracing::info!(id = %entry.id, user = %user_id, duration = entry.duration, "entry recorded");
    Ok(entry)
}

/// Fetch one of the user's entries.
pub fn get_entry(conn: &Connection, user_id: &str, entry_id: &str) -> Result<Option<VoiceEntry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM voice_entries WHERE id = ?1 AND user_id = ?2"),
            params![entry_id, user_id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// All of the user's entries, newest first.
pub fn list_entries(conn: &Connection, user_id: &str) -> Result<Vec<VoiceEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM voice_entries WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
    ))?;
    let entries = stmt
        .query_map(params![user_id], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Entries recorded on local `day`, newest first.
pub fn entries_for_day(
    conn: &Connection,
    user_id: &str,
    day: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<VoiceEntry>> {
    let (start, end) =
        day_bounds(day, offset).with_context(|| format!("date out of range: {day}"))?;
    entries_between(conn, user_id, start, end)
}

/// Entries with `start <= created_at < end`, newest first.
pub fn entries_between(
    conn: &Connection,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<VoiceEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM voice_entries \
         WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3 \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let entries = stmt
        .query_map(params![user_id, timestamp(start), timestamp(end)], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn record_and_fetch_entry() {
        let mut conn = db::open_memory_database().unwrap();
        let entry = record_entry(&mut conn, "me", "Walked the dog", 12.6, utc()).unwrap();
        assert_eq!(entry.duration, 13);
        assert!(entry.audio_url.is_none());

        let fetched = get_entry(&conn, "me", &entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
        assert!(get_entry(&conn, "someone-else", &entry.id).unwrap().is_none());
    }

    #[test]
    fn recording_counts_towards_stats() {
        let mut conn = db::open_memory_database().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        record_entry_at(&mut conn, "me", "one", 1.0, at, utc()).unwrap();
        record_entry_at(&mut conn, "me", "two", 1.0, at + chrono::Duration::days(1), utc()).unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let stats = stats::load_stats(&conn, "me", today).unwrap().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn rejects_empty_transcript_and_bad_duration() {
        let mut conn = db::open_memory_database().unwrap();
        assert!(record_entry(&mut conn, "me", "   ", 1.0, utc()).is_err());
        assert!(record_entry(&mut conn, "me", "ok", -1.0, utc()).is_err());
        assert!(record_entry(&mut conn, "me", "ok", f64::NAN, utc()).is_err());
        assert!(list_entries(&conn, "me").unwrap().is_empty());
    }

    #[test]
    fn entries_for_day_uses_local_day() {
        let mut conn = db::open_memory_database().unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        // 23:30 UTC on the 10th is already the 11th at UTC+2
        let late = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        record_entry_at(&mut conn, "me", "late", 1.0, late, plus_two).unwrap();
        record_entry_at(&mut conn, "me", "early", 1.0, early, plus_two).unwrap();

        let tenth = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let eleventh = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let on_tenth = entries_for_day(&conn, "me", tenth, plus_two).unwrap();
        let on_eleventh = entries_for_day(&conn, "me", eleventh, plus_two).unwrap();
        assert_eq!(on_tenth.len(), 1);
        assert_eq!(on_tenth[0].transcript.as_deref(), Some("early"));
        assert_eq!(on_eleventh.len(), 1);
        assert_eq!(on_eleventh[0].transcript.as_deref(), Some("late"));
    }

    #[test]
    fn list_is_newest_first() {
        let mut conn = db::open_memory_database().unwrap();
        let base = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        for (i, text) in ["a", "b", "c"].iter().enumerate() {
            record_entry_at(&mut conn, "me", text, 1.0, base + chrono::Duration::hours(i as i64), utc()).unwrap();
        }
        let texts: Vec<String> = list_entries(&conn, "me")
            .unwrap()
            .into_iter()
            .filter_map(|e| e.transcript)
            .collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
    }
}
