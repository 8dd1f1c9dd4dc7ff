//! MCP `diary_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DiaryStatsParams {
    #[schemars(description = "Diary owner. Defaults to the configured default user.")]
    pub user_id: Option<String>,
}
