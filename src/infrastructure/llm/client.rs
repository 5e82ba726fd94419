//! # LLM Client
//!
//! Wraps a `rig` completion model. Conversation memory is converted to rig messages,
//! the newest record becomes the prompt and everything before it the chat history.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{CompletionModel, Message, ToolDefinition};
use rig::message::{AssistantContent, ToolResultContent, UserContent};

use crate::domain::traits::LanguageModel;
use crate::domain::types::{MemoryRecord, ModelRequest, ModelTurn, ToolCall, ToolDescriptor};

pub struct RigModel<M> {
    model: M,
    model_name: String,
    temperature: Option<f64>,
}

impl<M: CompletionModel> RigModel<M> {
    pub fn new(model: M, model_name: impl Into<String>, temperature: Option<f64>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            temperature,
        }
    }
}

#[async_trait]
impl<M> LanguageModel for RigModel<M>
where
    M: CompletionModel + Send + Sync + 'static,
    M::Response: Send + Sync,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn> {
        let mut history = request
            .context
            .iter()
            .map(to_rig_message)
            .collect::<Result<Vec<_>>>()?;
        let prompt = history
            .pop()
            .ok_or_else(|| anyhow!("Cannot call the model with an empty context"))?;
        let tools: Vec<ToolDefinition> = request.tools.iter().map(tool_definition).collect();

        let mut builder = self
            .model
            .completion_request(prompt)
            .preamble(request.system.to_string())
            .messages(history)
            .tools(tools);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = self
            .model
            .completion(builder.build())
            .await
            .with_context(|| format!("Completion request to {} failed", self.model_name))?;

        Ok(turn_from_choice(response.choice.iter()))
    }
}

pub fn tool_definition(descriptor: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        name: descriptor.callable_name().to_string(),
        description: descriptor.description.clone().unwrap_or_default(),
        parameters: descriptor.parameters(),
    }
}

pub fn to_rig_message(record: &MemoryRecord) -> Result<Message> {
    match record {
        MemoryRecord::User { content } => Ok(Message::user(content.clone())),
        MemoryRecord::Assistant {
            content,
            tool_calls,
        } => {
            let mut parts = Vec::new();
            if let Some(text) = content.as_ref().filter(|t| !t.is_empty()) {
                parts.push(AssistantContent::text(text.clone()));
            }
            for call in tool_calls {
                parts.push(AssistantContent::tool_call(
                    call.id.clone(),
                    call.name.clone(),
                    call.arguments.clone(),
                ));
            }
            let content =
                OneOrMany::many(parts).map_err(|_| anyhow!("Assistant turn has no content"))?;
            Ok(Message::Assistant { id: None, content })
        }
        MemoryRecord::ToolResult {
            call_id, content, ..
        } => Ok(Message::User {
            content: OneOrMany::one(UserContent::tool_result(
                call_id.clone(),
                OneOrMany::one(ToolResultContent::text(content.clone())),
            )),
        }),
    }
}

pub fn turn_from_choice<'a>(choice: impl Iterator<Item = &'a AssistantContent>) -> ModelTurn {
    let mut text: Option<String> = None;
    let mut tool_calls = Vec::new();

    for content in choice {
        match content {
            AssistantContent::Text(t) => text.get_or_insert_with(String::new).push_str(&t.text),
            AssistantContent::ToolCall(tc) => tool_calls.push(ToolCall {
                id: tc.id.clone(),
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            }),
            _ => {} // reasoning and other content are not kept
        }
    }

    ModelTurn { text, tool_calls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_becomes_user_message() {
        let record = MemoryRecord::ToolResult {
            call_id: "call-1".into(),
            name: "list_agents".into(),
            content: "[]".into(),
        };
        let message = to_rig_message(&record).unwrap();
        assert!(matches!(message, Message::User { .. }));
    }

    #[test]
    fn test_empty_assistant_turn_is_rejected() {
        let record = MemoryRecord::Assistant {
            content: Some(String::new()),
            tool_calls: vec![],
        };
        assert!(to_rig_message(&record).is_err());
    }

    #[test]
    fn test_turn_collects_text_and_tool_calls() {
        let choice = vec![
            AssistantContent::text("waiting"),
            AssistantContent::tool_call("call-1", "wait_for_mentions", json!({"timeoutMs": 60000})),
        ];
        let turn = turn_from_choice(choice.iter());

        assert_eq!(turn.text.as_deref(), Some("waiting"));
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "wait_for_mentions");
        assert_eq!(turn.tool_calls[0].arguments["timeoutMs"], 60000);
    }

    #[test]
    fn test_tool_definition_uses_parameters() {
        let descriptor = ToolDescriptor::new(
            "create_thread",
            None,
            json!({"type": "object", "properties": {"threadName": {"type": "string"}}}),
        );
        let definition = tool_definition(&descriptor);
        assert_eq!(definition.name, "create_thread");
        assert_eq!(definition.description, "");
        assert!(definition.parameters["properties"].get("threadName").is_some());
    }
}
