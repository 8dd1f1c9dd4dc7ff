//! Extracted events, upcoming lists and reminder hand-out.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};

use super::types::{DiaryEvent, NewEvent, Reminder};
use super::{parse_timestamp, stats, timestamp};

const EVENT_COLUMNS: &str =
    "id, user_id, entry_id, title, description, event_date, reminded, reminder_minutes, created_at";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<DiaryEvent> {
    Ok(DiaryEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        entry_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        event_date: row.get(5)?,
        reminded: row.get(6)?,
        reminder_minutes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Store events for the user and count them. Returns how many were stored.
pub fn store_events(
    conn: &mut Connection,
    user_id: &str,
    entry_id: Option<&str>,
    events: &[NewEvent],
    reminder_minutes: i64,
) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let now = timestamp(Utc::now());
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO diary_events (id, user_id, entry_id, title, description, event_date, reminded, reminder_minutes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
        )?;
        for event in events {
            stmt.execute(params![
                uuid::Uuid::now_v7().to_string(),
                user_id,
                entry_id,
                event.title,
                event.description,
                timestamp(event.event_date),
                reminder_minutes,
                now,
            ])?;
        }
    }
    stats::add_events(&tx, user_id, events.len() as u32)?;
    tx.commit()?;

    tracing::info!(user = %user_id, entry = ?entry_id, count = events.len(), "events stored");
    Ok(events.len())
}

/// All of the user's events, latest date first.
pub fn list_events(conn: &Connection, user_id: &str) -> Result<Vec<DiaryEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM diary_events WHERE user_id = ?1 ORDER BY event_date DESC"
    ))?;
    let events = stmt
        .query_map(params![user_id], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Events dated at or after `now`, soonest first.
pub fn upcoming_events(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<DiaryEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM diary_events \
         WHERE user_id = ?1 AND event_date >= ?2 \
         ORDER BY event_date ASC LIMIT ?3"
    ))?;
    let events = stmt
        .query_map(params![user_id, timestamp(now), limit as i64], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Events dated in `[start, end)`.
pub fn events_between(
    conn: &Connection,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DiaryEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM diary_events \
         WHERE user_id = ?1 AND event_date >= ?2 AND event_date < ?3 \
         ORDER BY event_date ASC"
    ))?;
    let events = stmt
        .query_map(params![user_id, timestamp(start), timestamp(end)], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Hand out reminders whose lead time has started, marking them reminded so
/// each is delivered once. Events already in the past are never reminded.
pub fn take_due_reminders(
    conn: &mut Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Reminder>> {
    let tx = conn.transaction()?;
    let pending: Vec<DiaryEvent> = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM diary_events \
             WHERE user_id = ?1 AND reminded = 0 AND event_date > ?2 \
             ORDER BY event_date ASC"
        ))?;
        let rows = stmt
            .query_map(params![user_id, timestamp(now)], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let mut due = Vec::new();
    for mut event in pending {
        let Some(at) = parse_timestamp(&event.event_date) else {
            tracing::warn!(id = %event.id, date = %event.event_date, "unparseable event date");
            continue;
        };
        if at - Duration::minutes(event.reminder_minutes) > now {
            continue;
        }
        tx.execute(
            "UPDATE diary_events SET reminded = 1 WHERE id = ?1",
            params![event.id],
        )?;
        event.reminded = true;
        let lead = reminder_label(event.reminder_minutes);
        due.push(Reminder { event, lead });
    }
    tx.commit()?;

    if !due.is_empty() {
        tracing::info!(user = %user_id, count = due.len(), "reminders due");
    }
    Ok(due)
}

/// "2 day(s)", "3 hour(s)" or "45 minutes".
pub fn reminder_label(minutes: i64) -> String {
    if minutes >= 1440 {
        format!("{} day(s)", minutes / 1440)
    } else if minutes >= 60 {
        format!("{} hour(s)", minutes / 60)
    } else {
        format!("{minutes} minutes")
    }
}
