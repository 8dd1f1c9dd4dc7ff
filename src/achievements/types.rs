//! Achievement catalog entries, per-user counters and unlock records.
//!
//! [`AchievementKind`] maps a catalog `achievement_type` tag to the
//! [`UserStats`] counter it measures. Tags the binary does not know are kept
//! verbatim on the [`Achievement`] and simply never progress.

use serde::{Deserialize, Serialize};

/// Reads one counter out of a stats snapshot.
pub type StatAccessor = fn(&UserStats) -> u32;

/// Which counter an achievement tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Total recorded entries.
    Entries,
    /// Current run of consecutive days with an entry.
    Streak,
    /// Total extracted events.
    Events,
    /// Total questions asked of the diary.
    Questions,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 4] = [Self::Entries, Self::Streak, Self::Events, Self::Questions];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entries => "entries",
            Self::Streak => "streak",
            Self::Events => "events",
            Self::Questions => "questions",
        }
    }

    /// The stats field this kind is measured against.
    pub fn accessor(&self) -> StatAccessor {
        match self {
            Self::Entries => |s: &UserStats| s.total_entries,
            Self::Streak => |s: &UserStats| s.current_streak,
            Self::Events => |s: &UserStats| s.total_events,
            Self::Questions => |s: &UserStats| s.total_questions,
        }
    }
}

impl std::fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AchievementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entries" => Ok(Self::Entries),
            "streak" => Ok(Self::Streak),
            "events" => Ok(Self::Events),
            "questions" => Ok(Self::Questions),
            _ => Err(format!("unknown achievement type: {s}")),
        }
    }
}

/// An immutable catalog entry, matching the `achievements` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Emoji shown next to the name in notifications.
    pub icon: String,
    /// Raw tag from the catalog; see [`Achievement::kind`].
    pub achievement_type: String,
    pub target_count: i64,
}

impl Achievement {
    /// Parsed kind, or `None` for tags this binary does not track.
    pub fn kind(&self) -> Option<AchievementKind> {
        self.achievement_type.parse().ok()
    }

    /// Current value of the counter this achievement tracks.
    pub fn stat_value(&self, stats: &UserStats) -> Option<u32> {
        self.kind().map(|k| (k.accessor())(stats))
    }
}

/// Aggregate counters for one user, matching the `user_stats` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_entries: u32,
    pub total_events: u32,
    pub total_questions: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// An unlock record, matching the `user_achievements` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: String,
    pub user_id: String,
    pub achievement_id: String,
    /// RFC 3339 unlock timestamp.
    pub unlocked_at: String,
}

/// Per-user state of one achievement. `Unlocked` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AchievementState {
    Locked { progress: f64 },
    Unlocked { unlocked_at: String },
}

/// A catalog entry paired with its state, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    #[serde(flatten)]
    pub state: AchievementState,
    /// Always 1.0 once unlocked, even if the counter later drops.
    pub display_progress: f64,
}
