use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Datelike, FixedOffset, NaiveDate};
use rusqlite::Connection;

use super::types::{DailySummary, DayActivity};
use super::{day_bounds, entries, events, local_day, parse_timestamp};

/// Per-day entry and event counts for every day of `year`-`month`.
pub fn month_activity(
    conn: &Connection,
    user_id: &str,
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> Result<Vec<DayActivity>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month: {year}-{month}"))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .context("month out of range")?;

    let mut days: BTreeMap<NaiveDate, DayActivity> = first
        .iter_days()
        .take_while(|d| *d < next_month)
        .map(|d| {
            (
                d,
                DayActivity {
                    date: d.format("%Y-%m-%d").to_string(),
                    entry_count: 0,
                    event_count: 0,
                },
            )
        })
        .collect();

    let (start, _) = day_bounds(first, offset).context("month out of range")?;
    let (end, _) = day_bounds(next_month, offset).context("month out of range")?;

    for entry in entries::entries_between(conn, user_id, start, end)? {
        if let Some(at) = parse_timestamp(&entry.created_at) {
            if let Some(day) = days.get_mut(&local_day(at, offset)) {
                day.entry_count += 1;
            }
        }
    }
    for event in events::events_between(conn, user_id, start, end)? {
        if let Some(at) = parse_timestamp(&event.event_date) {
            if let Some(day) = days.get_mut(&local_day(at, offset)) {
                day.event_count += 1;
            }
        }
    }

    debug_assert!(days.keys().all(|d| d.month() == month));
    Ok(days.into_values().collect())
}

/// Roll up local `day`: entry count, total duration and the entries'
/// summaries joined together, or a count sentence when none has one.
pub fn daily_summary(
    conn: &Connection,
    user_id: &str,
    day: NaiveDate,
    offset: FixedOffset,
) -> Result<DailySummary> {
    let mut entries = entries::entries_for_day(conn, user_id, day, offset)?;
    entries.reverse(); // oldest first reads naturally

    let total_duration: i64 = entries.iter().map(|e| e.duration).sum();
    let summaries: Vec<&str> = entries
        .iter()
        .filter_map(|e| e.summary.as_deref())
        .filter(|s| !s.trim().is_empty())
        .collect();

    let summary = if entries.is_empty() {
        "No entries for this day yet. Tell me how it went!".to_string()
    } else if !summaries.is_empty() {
        summaries.join(". ")
    } else if entries.len() == 1 {
        "1 note recorded.".to_string()
    } else {
        format!("{} notes recorded.", entries.len())
    };

    Ok(DailySummary {
        date: day.format("%Y-%m-%d").to_string(),
        entry_count: entries.len() as u32,
        total_duration,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::diary::types::NewEvent;
    use chrono::{TimeZone, Utc};
    use rusqlite::params;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn month_has_one_row_per_day() {
        let conn = db::open_memory_database().unwrap();
        assert_eq!(month_activity(&conn, "me", 2026, 2, utc()).unwrap().len(), 28);
        assert_eq!(month_activity(&conn, "me", 2028, 2, utc()).unwrap().len(), 29);
        assert_eq!(month_activity(&conn, "me", 2026, 12, utc()).unwrap().len(), 31);
        assert!(month_activity(&conn, "me", 2026, 13, utc()).is_err());
    }

    #[test]
    fn month_counts_entries_and_events() {
        let mut conn = db::open_memory_database().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        entries::record_entry_at(&mut conn, "me", "a", 1.0, at, utc()).unwrap();
        entries::record_entry_at(&mut conn, "me", "b", 1.0, at, utc()).unwrap();
        // Outside the month
        entries::record_entry_at(&mut conn, "me", "c", 1.0, at + chrono::Duration::days(30), utc()).unwrap();
        events::store_events(
            &mut conn,
            "me",
            None,
            &[NewEvent {
                title: "Dinner".into(),
                description: None,
                event_date: Utc.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).unwrap(),
            }],
            60,
        )
        .unwrap();

        let days = month_activity(&conn, "me", 2026, 3, utc()).unwrap();
        assert_eq!(days[9].date, "2026-03-10");
        assert_eq!(days[9].entry_count, 2);
        assert_eq!(days[19].event_count, 1);
        let total: u32 = days.iter().map(|d| d.entry_count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn summary_prefers_entry_summaries() {
        let mut conn = db::open_memory_database().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let empty = daily_summary(&conn, "me", day, utc()).unwrap();
        assert_eq!(empty.entry_count, 0);

        let first = entries::record_entry_at(&mut conn, "me", "a", 30.0, at, utc()).unwrap();
        entries::record_entry_at(&mut conn, "me", "b", 45.0, at + chrono::Duration::hours(1), utc()).unwrap();

        let counted = daily_summary(&conn, "me", day, utc()).unwrap();
        assert_eq!(counted.entry_count, 2);
        assert_eq!(counted.total_duration, 75);
        assert_eq!(counted.summary, "2 notes recorded.");

        conn.execute(
            "UPDATE voice_entries SET summary = 'Went running' WHERE id = ?1",
            params![first.id],
        )
        .unwrap();
        let summarized = daily_summary(&conn, "me", day, utc()).unwrap();
        assert_eq!(summarized.summary, "Went running");
    }
}
