//! # Coding Agent
//!
//! Builds the chat agent from the tool set and the model settings, and runs agent steps:
//! the model is called repeatedly, executing any tool calls it requests,
//! until it answers with plain text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::application::formatter::describe_tools;
use crate::domain::config::{AgentSettings, enter_project_dir};
use crate::domain::traits::{AgentSession, EnvSource, LanguageModel, SharedTool};
use crate::domain::types::{
    AgentResponse, ChatMessage, MemoryRecord, ModelRequest, StepInfo, ToolCall, ToolCallRecord,
    ToolDescriptor, estimate_tokens,
};
use crate::infrastructure::llm::create_model;
use crate::strings::prompts::{AGENT_ROLE_NAME, coding_agent_prompt};

/// Enter the project directory (if any), render the system instructions and build the agent.
///
/// Fails if `MODEL_TEMPERATURE` or `MODEL_TOKEN` are missing or malformed,
/// or if the provider is not supported.
pub fn configure_agent(
    env: &impl EnvSource,
    tools: Vec<SharedTool>,
    project_dir: Option<&Path>,
) -> Result<ChatAgent> {
    if let Some(dir) = project_dir {
        enter_project_dir(dir)?;
    }

    let tools_description = describe_tools(&tools);
    info!("{}", tools_description);
    let system_message = coding_agent_prompt(&tools_description);

    let settings = AgentSettings::from_env(env).context("Invalid model configuration")?;
    let model = create_model(&settings.model)?;
    match settings.token_limit {
        Some(limit) => info!(
            "Configured agent on {} with {} tools and a {} token budget",
            model.model_name(),
            tools.len(),
            limit
        ),
        None => warn!(
            "Configured agent on {} with {} tools; non-positive token budget, memory is not trimmed",
            model.model_name(),
            tools.len()
        ),
    }

    Ok(ChatAgent::new(system_message, model, tools, settings.token_limit))
}

pub struct ChatAgent {
    system_message: String,
    model: Box<dyn LanguageModel>,
    tools: Vec<SharedTool>,
    descriptors: Vec<ToolDescriptor>,
    memory: Vec<MemoryRecord>,
    token_limit: Option<usize>,
}

impl ChatAgent {
    pub fn new(
        system_message: String,
        model: Box<dyn LanguageModel>,
        tools: Vec<SharedTool>,
        token_limit: Option<usize>,
    ) -> Self {
        let descriptors = tools.iter().map(|t| t.descriptor().clone()).collect();
        Self {
            system_message,
            model,
            tools,
            descriptors,
            memory: Vec::new(),
            token_limit,
        }
    }

    #[cfg(test)]
    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    #[cfg(test)]
    pub fn memory(&self) -> &[MemoryRecord] {
        &self.memory
    }

    /// Drop the oldest records that no longer fit the token budget,
    /// then shorten tool output if the newest exchange alone is still too large.
    fn trim_memory(&mut self) {
        let Some(limit) = self.token_limit else {
            return;
        };
        let system_tokens = estimate_tokens(&self.system_message);
        let start = context_start(system_tokens, &self.memory, limit);
        if start > 0 {
            debug!("Dropping {} records from agent memory", start);
            self.memory.drain(..start);
        }

        let total = system_tokens
            + self
                .memory
                .iter()
                .map(MemoryRecord::estimated_tokens)
                .sum::<usize>();
        if total > limit {
            let remaining = truncate_tool_results(&mut self.memory, total - limit);
            if remaining > 0 {
                warn!("Agent context exceeds the token budget by {} tokens", remaining);
            } else {
                debug!("Truncated tool output to fit the token budget");
            }
        }
    }

    /// Tool failures are returned to the model as text, never raised.
    async fn invoke_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self
            .tools
            .iter()
            .find(|t| t.descriptor().callable_name() == call.name)
        else {
            warn!("Model requested unknown tool {}", call.name);
            return format!("Error: tool '{}' is not available", call.name);
        };

        info!("Calling tool {} with {}", call.name, call.arguments);
        match tool.call(call.arguments.clone()).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {:#}", call.name, e);
                format!("Error: {:#}", e)
            }
        }
    }
}

#[async_trait]
impl AgentSession for ChatAgent {
    async fn step(&mut self, input: &str) -> Result<AgentResponse> {
        self.memory.push(MemoryRecord::user(input));
        let mut info = StepInfo::default();

        loop {
            self.trim_memory();
            let turn = self
                .model
                .complete(ModelRequest {
                    system: &self.system_message,
                    context: &self.memory,
                    tools: &self.descriptors,
                })
                .await
                .context("Agent step failed")?;
            info.model_calls += 1;

            if turn.tool_calls.is_empty() {
                let content = turn.text.unwrap_or_default();
                // Empty replies are not replayable to the provider.
                if !content.is_empty() {
                    self.memory.push(MemoryRecord::Assistant {
                        content: Some(content.clone()),
                        tool_calls: Vec::new(),
                    });
                }
                return Ok(AgentResponse {
                    msgs: vec![ChatMessage::assistant(AGENT_ROLE_NAME, content)],
                    terminated: false,
                    info,
                });
            }

            self.memory.push(MemoryRecord::Assistant {
                content: turn.text.clone(),
                tool_calls: turn.tool_calls.clone(),
            });
            for call in &turn.tool_calls {
                let result = self.invoke_tool(call).await;
                info.tool_calls.push(ToolCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: result.clone(),
                });
                self.memory.push(MemoryRecord::ToolResult {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    content: result,
                });
            }
        }
    }
}

/// Appended to tool output that was shortened to fit the token budget.
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Index of the first record inside the token budget.
///
/// Windows only open on a user message, so every tool result stays behind its call.
/// The newest user message is always kept. Returns 0 when everything fits.
pub fn context_start(system_tokens: usize, memory: &[MemoryRecord], limit: usize) -> usize {
    let mut total = system_tokens;
    let mut window = None;
    for (idx, record) in memory.iter().enumerate().rev() {
        total += record.estimated_tokens();
        if total > limit {
            if let Some(start) = window {
                return start;
            }
        }
        if matches!(record, MemoryRecord::User { .. }) {
            window = Some(idx);
        }
    }

    if total <= limit { 0 } else { window.unwrap_or(0) }
}

/// Shorten tool results, largest first, until `overflow` tokens are recovered.
/// Returns the overflow that could not be recovered.
pub fn truncate_tool_results(memory: &mut [MemoryRecord], mut overflow: usize) -> usize {
    let mut order: Vec<usize> = memory
        .iter()
        .enumerate()
        .filter(|(_, record)| matches!(record, MemoryRecord::ToolResult { .. }))
        .map(|(idx, _)| idx)
        .collect();
    order.sort_by_key(|&idx| std::cmp::Reverse(memory[idx].estimated_tokens()));

    let marker_chars = TRUNCATION_MARKER.chars().count();
    for idx in order {
        if overflow == 0 {
            break;
        }
        let MemoryRecord::ToolResult { content, .. } = &mut memory[idx] else {
            continue;
        };
        let chars = content.chars().count();
        let keep = chars.saturating_sub(overflow * 4 + marker_chars);
        if keep + marker_chars >= chars {
            continue;
        }

        let before = estimate_tokens(content);
        let mut shortened: String = content.chars().take(keep).collect();
        shortened.push_str(TRUNCATION_MARKER);
        *content = shortened;
        overflow = overflow.saturating_sub(before.saturating_sub(estimate_tokens(content)));
    }
    overflow
}
