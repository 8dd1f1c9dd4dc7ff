//! MCP `upcoming_events` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `upcoming_events` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpcomingEventsParams {
    #[schemars(description = "Diary owner. Defaults to the configured default user.")]
    pub user_id: Option<String>,

    /// Defaults to `diary.upcoming_events_limit`.
    #[schemars(description = "Maximum number of events to return (1-50). Defaults to 5.")]
    pub limit: Option<usize>,
}
