//! Diary record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded voice note, matching the `voice_entries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    pub user_id: String,
    /// Audio is not kept server-side, so this stays `None` for new entries.
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    /// Recording length in whole seconds.
    pub duration: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// An event extracted from an entry, matching the `diary_events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEvent {
    pub id: String,
    pub user_id: String,
    /// Source entry; cleared if that entry is deleted.
    pub entry_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    /// Set once a reminder has been handed out.
    pub reminded: bool,
    /// How long before `event_date` the reminder becomes due.
    pub reminder_minutes: i64,
    pub created_at: String,
}

/// An event ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
}

/// A due reminder and a human-readable lead time ("1 hour(s)").
#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub event: DiaryEvent,
    pub lead: String,
}

/// Activity on one local day, for the month calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    /// `YYYY-MM-DD`
    pub date: String,
    pub entry_count: u32,
    pub event_count: u32,
}

/// Roll-up of one local day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub entry_count: u32,
    /// Seconds recorded across the day's entries.
    pub total_duration: i64,
    pub summary: String,
}
