//! System prompts and diary context blocks.

use chrono::{FixedOffset, NaiveDate};

use crate::diary::types::{DiaryEvent, VoiceEntry};
use crate::diary::{local_day, parse_timestamp};

pub fn transcription_system(language: &str) -> String {
    format!(
        "You are a professional audio transcriber. Transcribe the provided audio as accurately as possible.

INSTRUCTIONS:
- Transcribe EXACTLY what is said, word for word
- Keep the natural punctuation and structure of speech
- Use an ellipsis (...) for long pauses
- Write [inaudible] for anything you cannot make out
- Do NOT add comments, summaries or interpretations
- Reply ONLY with the literal transcription
- The audio is in {language}"
    )
}

pub const TRANSCRIPTION_REQUEST: &str = "Transcribe this audio literally:";

pub fn extraction_system(today: NaiveDate) -> String {
    format!(
        "You are a personal diary assistant. Read the transcript and extract ONLY the events or appointments mentioned with a date, if any.

Reply ONLY with valid JSON in exactly this format:
{{
  \"events\": [
    {{
      \"title\": \"event title\",
      \"date\": \"YYYY-MM-DD\",
      \"description\": \"optional description\"
    }}
  ]
}}

If there are no events, return an empty array for events.
Today's date is: {}",
        today.format("%Y-%m-%d")
    )
}

pub fn assistant_system(language: &str, today: NaiveDate, entries: &str, events: &str) -> String {
    format!(
        "You are a personal assistant that helps the user explore their voice diary.
You have access to every diary entry and recorded event.
Answer concisely and helpfully in {language}.
You can summarize, count days, spot patterns, look up specific details, and so on.

Today is: {}

DIARY ENTRIES:
{entries}

RECORDED EVENTS:
{events}",
        today.format("%A, %-d %B %Y")
    )
}

/// One block per entry, in the order given, labeled with its local date.
pub fn entries_context(entries: &[VoiceEntry], offset: FixedOffset) -> String {
    if entries.is_empty() {
        return "There are no diary entries.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            let label = parse_timestamp(&e.created_at)
                .map(|at| local_day(at, offset).format("%A, %-d %B %Y").to_string())
                .unwrap_or_else(|| e.created_at.clone());
            format!("[{label}]: {}", e.transcript.as_deref().unwrap_or(""))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn events_context(events: &[DiaryEvent], offset: FixedOffset) -> String {
    if events.is_empty() {
        return "There are no recorded events.".to_string();
    }
    events
        .iter()
        .map(|e| {
            let date = parse_timestamp(&e.event_date)
                .map(|at| local_day(at, offset).format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| e.event_date.clone());
            format!("- {} ({date}): {}", e.title, e.description.as_deref().unwrap_or(""))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
