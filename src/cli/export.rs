use anyhow::Result;
use serde::Serialize;

use crate::achievements::store::{AchievementStore, SqliteAchievementStore};
use crate::achievements::types::{UserAchievement, UserStats};
use crate::config::MurmurConfig;
use crate::diary::types::{DiaryEvent, VoiceEntry};
use crate::diary::{entries, events, local_day};

/// Export format: everything stored for one user.
#[derive(Debug, Serialize)]
struct ExportData {
    user_id: String,
    stats: Option<UserStats>,
    entries: Vec<VoiceEntry>,
    events: Vec<DiaryEvent>,
    achievements: Vec<UserAchievement>,
}

/// Export a user's diary as JSON to stdout.
pub fn export(config: &MurmurConfig, user: &str) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let today = local_day(chrono::Utc::now(), config.diary.offset());
    let store = SqliteAchievementStore::new(&conn, today);

    let data = ExportData {
        user_id: user.to_string(),
        stats: store.fetch_stats(user)?,
        entries: entries::list_entries(&conn, user)?,
        events: events::list_events(&conn, user)?,
        achievements: store.fetch_unlocks(user)?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!(
        "Exported {} entries, {} events and {} achievements.",
        data.entries.len(),
        data.events.len(),
        data.achievements.len()
    );

    Ok(())
}
