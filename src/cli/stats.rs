use anyhow::Result;
use chrono::Utc;

use crate::achievements::engine;
use crate::achievements::store::{AchievementStore, SqliteAchievementStore};
use crate::achievements::types::AchievementState;
use crate::config::MurmurConfig;
use crate::diary::local_day;

/// Display a user's diary statistics and achievement progress in the terminal.
pub fn stats(config: &MurmurConfig, user: &str) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let today = local_day(Utc::now(), config.diary.offset());
    let store = SqliteAchievementStore::new(&conn, today);

    let stats = store.fetch_stats(user)?;
    let catalog = store.fetch_catalog()?;
    let unlocks = store.fetch_unlocks(user)?;
    let snapshot = stats.unwrap_or_default();

    println!("Diary Statistics ({user})");
    println!("{}", "=".repeat(40));
    if stats.is_none() {
        println!("  No activity recorded yet.");
    }
    println!("  Entries:             {}", snapshot.total_entries);
    println!("  Events:              {}", snapshot.total_events);
    println!("  Questions:           {}", snapshot.total_questions);
    println!("  Current streak:      {} day(s)", snapshot.current_streak);
    println!("  Longest streak:      {} day(s)", snapshot.longest_streak);
    println!();

    println!("Achievements ({}/{}):", unlocks.len(), catalog.len());
    for status in engine::statuses(&catalog, stats.as_ref(), &unlocks) {
        let mark = match &status.state {
            AchievementState::Unlocked { .. } => "x",
            AchievementState::Locked { .. } => " ",
        };
        println!(
            "  [{mark}] {} {:<22} {:>5.0}%",
            status.achievement.icon,
            status.achievement.name,
            status.display_progress * 100.0
        );
    }

    Ok(())
}
