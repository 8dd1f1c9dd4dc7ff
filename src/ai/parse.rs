//! Turning model output into events.
//!
//! Models wrap JSON in markdown fences and invent date formats; everything
//! here is lenient and drops what it cannot read instead of failing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use crate::diary::types::NewEvent;
use crate::diary::YEAR_RANGE;

/// One event as the model reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    events: Vec<ExtractedEvent>,
}

/// Remove ```json / ``` fences and surrounding whitespace.
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Events from a model reply. Anything unparseable yields no events.
pub fn parse_events(content: &str) -> Vec<ExtractedEvent> {
    let cleaned = strip_code_fences(content);
    match serde_json::from_str::<ExtractionPayload>(&cleaned) {
        Ok(payload) => payload.events,
        Err(e) => {
            tracing::warn!(error = %e, "model reply is not valid event JSON");
            Vec::new()
        }
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM[:SS]` read as UTC. The UTC year must fit four digits,
/// since stored timestamps are compared as text.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    read_date(raw.trim()).filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

fn read_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}

impl ExtractedEvent {
    /// A storable event, or `None` if the title is blank or the date unreadable.
    pub fn to_new_event(&self) -> Option<NewEvent> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        let Some(event_date) = parse_event_date(&self.date) else {
            tracing::warn!(title = %title, date = %self.date, "skipping event with unreadable date");
            return None;
        };
        Some(NewEvent {
            title: title.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            event_date,
        })
    }
}
