//! MCP `recent_entries` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recent_entries` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecentEntriesParams {
    /// Diary owner. Defaults to the configured default user.
    #[schemars(description = "Diary owner. Defaults to the configured default user.")]
    pub user_id: Option<String>,

    /// Only entries recorded on this local day (`YYYY-MM-DD`).
    #[schemars(description = "Only entries from this day, formatted YYYY-MM-DD")]
    pub date: Option<String>,

    /// Maximum number of entries to return (1–50). Defaults to 10.
    #[schemars(description = "Maximum number of entries to return (1-50). Defaults to 10.")]
    pub limit: Option<usize>,
}
