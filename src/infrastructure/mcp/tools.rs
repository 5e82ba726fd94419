//! # Remote Tools
//!
//! Tools advertised by the Coral server, invoked through the shared MCP session.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::traits::Tool;
use crate::domain::types::ToolDescriptor;
use crate::infrastructure::mcp::client::McpSession;

pub struct RemoteTool {
    descriptor: ToolDescriptor,
    session: Arc<McpSession>,
}

impl RemoteTool {
    pub fn from_mcp(tool: rmcp::model::Tool, session: Arc<McpSession>) -> Self {
        Self {
            descriptor: descriptor_from_mcp(&tool),
            session,
        }
    }
}

pub fn descriptor_from_mcp(tool: &rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor::new(
        tool.name.to_string(),
        tool.description.as_ref().map(|d| d.to_string()),
        Value::Object(tool.input_schema.as_ref().clone()),
    )
}

#[async_trait]
impl Tool for RemoteTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => bail!("Tool arguments must be a JSON object, got {}", other),
        };

        let result = self
            .session
            .call_tool(CallToolRequestParam {
                name: self.descriptor.name.clone().into(),
                arguments,
            })
            .await
            .with_context(|| format!("Coral tool {} failed", self.descriptor.name))?;

        let text = flatten_result(&result);
        if result.is_error.unwrap_or(false) {
            bail!(text);
        }
        Ok(text)
    }
}

/// Text parts joined with newlines; other parts as JSON.
pub fn flatten_result(result: &CallToolResult) -> String {
    let parts: Vec<String> = result
        .content
        .iter()
        .map(|content| match &content.raw {
            RawContent::Text(text) => text.text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        })
        .collect();

    if parts.is_empty() {
        if let Some(structured) = &result.structured_content {
            return structured.to_string();
        }
    }
    parts.join("\n")
}
