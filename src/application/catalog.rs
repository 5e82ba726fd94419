//! # Tool Catalog
//!
//! Narrows the Coral server's catalog to the coordination primitives this agent may use
//! and appends the local code-execution tools.

use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::info;

use crate::domain::traits::{SharedTool, ToolProvider};

/// Coordination primitives the agent is allowed to call.
pub const COORDINATION_TOOLS: [&str; 7] = [
    "list_agents",
    "create_thread",
    "add_participant",
    "remove_participant",
    "close_thread",
    "send_message",
    "wait_for_mentions",
];

/// Keep allow-listed tools in catalog order; later duplicates of a name are dropped.
pub fn select_coordination_tools(catalog: Vec<SharedTool>) -> Vec<SharedTool> {
    let mut seen = HashSet::new();
    catalog
        .into_iter()
        .filter(|tool| {
            let name = tool.descriptor().callable_name();
            COORDINATION_TOOLS.contains(&name) && seen.insert(name.to_string())
        })
        .collect()
}

/// Fetch the remote catalog, filter it, then append every local tool unfiltered.
pub async fn build_tool_set(
    remote: &dyn ToolProvider,
    local: &dyn ToolProvider,
) -> Result<Vec<SharedTool>> {
    let catalog = remote
        .tools()
        .await
        .context("Failed to retrieve the remote tool catalog")?;
    let offered = catalog.len();

    let mut tools = select_coordination_tools(catalog);
    info!("Selected {} of {} remote tools", tools.len(), offered);

    tools.extend(local.tools().await.context("Failed to load local tools")?);
    Ok(tools)
}
