//! MCP `achievement_progress` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `achievement_progress` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AchievementProgressParams {
    #[schemars(description = "Diary owner. Defaults to the configured default user.")]
    pub user_id: Option<String>,

    /// If `true`, list only achievements that are still locked.
    #[schemars(description = "If true, only return achievements that are still locked")]
    pub locked_only: Option<bool>,
}
