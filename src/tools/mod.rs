pub mod achievement_progress;
pub mod diary_stats;
pub mod recent_entries;
pub mod upcoming_events;

use achievement_progress::AchievementProgressParams;
use chrono::{NaiveDate, Utc};
use diary_stats::DiaryStatsParams;
use recent_entries::RecentEntriesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};
use upcoming_events::UpcomingEventsParams;

use crate::achievements::store::SqliteAchievementStore;
use crate::achievements::tracker;
use crate::achievements::types::AchievementState;
use crate::config::MurmurConfig;
use crate::diary::{entries, events, is_storable_day, local_day, stats};

const DEFAULT_RECENT: usize = 10;
const MAX_LIMIT: usize = 50;

/// The murmur MCP tool handler. Holds the shared db connection and config and
/// exposes diary queries via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct MurmurTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    config: Arc<MurmurConfig>,
}

impl MurmurTools {
    fn user(&self, requested: Option<String>) -> String {
        requested
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.config.storage.default_user.clone())
    }

    fn today(&self) -> NaiveDate {
        local_day(Utc::now(), self.config.diary.offset())
    }

    /// Run a db closure on the blocking pool and serialize its result.
    async fn query<T, F>(&self, f: F) -> Result<String, String>
    where
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
        T: serde::Serialize + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let value = tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("query failed: {e:#}"))?;

        serde_json::to_string(&value).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_router]
impl MurmurTools {
    pub fn new(db: Arc<Mutex<Connection>>, config: Arc<MurmurConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            config,
        }
    }

    /// List diary entries, newest first.
    #[tool(description = "List voice diary entries, newest first. Optionally restrict to one day (YYYY-MM-DD).")]
    async fn recent_entries(
        &self,
        Parameters(params): Parameters<RecentEntriesParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user_id);
        let limit = params.limit.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_LIMIT);
        let day = params
            .date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .ok()
                    .filter(|day| is_storable_day(*day))
                    .ok_or_else(|| format!("invalid date '{d}', expected YYYY-MM-DD"))
            })
            .transpose()?;
        let offset = self.config.diary.offset();

        tracing::info!(user = %user, ?day, limit, "recent_entries called");

        self.query(move |conn| {
            let mut list = match day {
                Some(day) => entries::entries_for_day(conn, &user, day, offset)?,
                None => entries::list_entries(conn, &user)?,
            };
            list.truncate(limit);
            Ok(list)
        })
        .await
    }

    /// Events dated from now on, soonest first.
    #[tool(description = "List upcoming events extracted from the diary, soonest first.")]
    async fn upcoming_events(
        &self,
        Parameters(params): Parameters<UpcomingEventsParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user_id);
        let limit = params
            .limit
            .unwrap_or(self.config.diary.upcoming_events_limit)
            .clamp(1, MAX_LIMIT);

        tracing::info!(user = %user, limit, "upcoming_events called");

        self.query(move |conn| events::upcoming_events(conn, &user, Utc::now(), limit))
            .await
    }

    #[tool(description = "Get diary statistics: total entries, events, questions, current and longest streak.")]
    async fn diary_stats(
        &self,
        Parameters(params): Parameters<DiaryStatsParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user_id);
        let today = self.today();

        tracing::info!(user = %user, "diary_stats called");

        self.query(move |conn| Ok(stats::load_stats(conn, &user, today)?.unwrap_or_default()))
            .await
    }

    /// Achievement panel; records any unlock that became eligible.
    #[tool(description = "Show every achievement with its progress (0.0-1.0) and unlock state. Records newly earned achievements.")]
    async fn achievement_progress(
        &self,
        Parameters(params): Parameters<AchievementProgressParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user_id);
        let locked_only = params.locked_only.unwrap_or(false);
        let today = self.today();

        tracing::info!(user = %user, locked_only, "achievement_progress called");

        self.query(move |conn| {
            let store = SqliteAchievementStore::new(conn, today);
            let mut overview = tracker::overview(&store, &user, |icon, name| {
                tracing::info!(user = %user, "{icon} Achievement unlocked! {name}");
            })?;
            if locked_only {
                overview
                    .achievements
                    .retain(|a| matches!(a.state, AchievementState::Locked { .. }));
            }
            Ok(overview)
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for MurmurTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "murmur exposes a voice diary. Use recent_entries to read notes, \
                 upcoming_events for extracted appointments, and diary_stats or \
                 achievement_progress for streaks and milestones."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
