//! # Domain Types
//!
//! Tool descriptors, conversation records and agent responses shared across layers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Name reported for a tool whose callable name cannot be determined.
pub const UNKNOWN_TOOL: &str = "unknown_tool";

/// A named, schema-described callable the agent may invoke.
///
/// `schema` holds the function schema (`name`, `description`, `parameters`)
/// exactly as it is embedded in the system instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub schema: Option<Value>,
}

impl ToolDescriptor {
    /// Build a descriptor from a JSON-schema `parameters` object.
    pub fn new(name: impl Into<String>, description: Option<String>, parameters: Value) -> Self {
        let name = name.into();
        let schema = json!({
            "name": name,
            "description": description.clone().unwrap_or_default(),
            "parameters": parameters,
        });
        Self {
            name,
            description,
            schema: Some(schema),
        }
    }

    /// The name the tool is invoked by, or `unknown_tool` if it has none.
    pub fn callable_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNKNOWN_TOOL
        } else {
            &self.name
        }
    }

    /// Argument names in declaration order, taken from `parameters.properties`.
    pub fn arg_names(&self) -> Vec<String> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.get("parameters"))
            .and_then(|params| params.get("properties"))
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The `parameters` schema, defaulting to an empty object schema.
    pub fn parameters(&self) -> Value {
        self.schema
            .as_ref()
            .and_then(|schema| schema.get("parameters"))
            .cloned()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One entry of the agent's conversation memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryRecord {
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

impl MemoryRecord {
    pub fn user(content: impl Into<String>) -> Self {
        MemoryRecord::User {
            content: content.into(),
        }
    }

    /// Rough token cost of this record.
    pub fn estimated_tokens(&self) -> usize {
        match self {
            MemoryRecord::User { content } => estimate_tokens(content),
            MemoryRecord::Assistant {
                content,
                tool_calls,
            } => {
                let text = content.as_deref().map(estimate_tokens).unwrap_or(0);
                let calls: usize = tool_calls
                    .iter()
                    .map(|call| estimate_tokens(&call.name) + estimate_tokens(&call.arguments.to_string()))
                    .sum();
                text + calls
            }
            MemoryRecord::ToolResult { content, .. } => estimate_tokens(content),
        }
    }
}

/// About four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Input to a single model round-trip.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub context: &'a [MemoryRecord],
    pub tools: &'a [ToolDescriptor],
}

/// What the model produced for one round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Assistant,
}

/// A message returned by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role_name: String,
    pub role_type: RoleType,
    #[serde(default)]
    pub meta_dict: Map<String, Value>,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(role_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            role_type: RoleType::Assistant,
            meta_dict: Map::new(),
            content: content.into(),
        }
    }

    /// Dictionary form: role fields, then metadata entries, then content.
    pub fn to_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("role_name".into(), Value::String(self.role_name.clone()));
        dict.insert(
            "role_type".into(),
            serde_json::to_value(self.role_type).unwrap_or(Value::Null),
        );
        for (key, value) in &self.meta_dict {
            dict.insert(key.clone(), value.clone());
        }
        dict.insert("content".into(), Value::String(self.content.clone()));
        Value::Object(dict)
    }
}

/// A tool call made while producing a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Value,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub tool_calls: Vec<ToolCallRecord>,
    pub model_calls: usize,
}

/// Result of one agent step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub msgs: Vec<ChatMessage>,
    pub terminated: bool,
    pub info: StepInfo,
}

impl AgentResponse {
    pub fn first_message(&self) -> anyhow::Result<&ChatMessage> {
        self.msgs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Agent response contained no messages"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_names_follow_declaration_order() {
        let tool = ToolDescriptor::new(
            "send_message",
            Some("Send a message".into()),
            json!({
                "type": "object",
                "properties": {
                    "threadId": {"type": "string"},
                    "content": {"type": "string"},
                    "mentions": {"type": "array"}
                }
            }),
        );
        assert_eq!(tool.arg_names(), vec!["threadId", "content", "mentions"]);
    }

    #[test]
    fn test_arg_names_empty_without_schema() {
        let tool = ToolDescriptor {
            name: "list_agents".into(),
            description: None,
            schema: None,
        };
        assert!(tool.arg_names().is_empty());
        assert_eq!(tool.parameters()["type"], "object");
    }

    #[test]
    fn test_blank_name_is_unknown_tool() {
        let tool = ToolDescriptor::new("  ", None, json!({}));
        assert_eq!(tool.callable_name(), UNKNOWN_TOOL);
    }

    #[test]
    fn test_to_dict_merges_meta_before_content() {
        let mut msg = ChatMessage::assistant("coding_agent", "done");
        msg.meta_dict.insert("threadId".into(), json!("t-1"));

        let dict = msg.to_dict();
        let keys: Vec<&String> = dict.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["role_name", "role_type", "threadId", "content"]);
        assert_eq!(dict["role_type"], "assistant");
        assert_eq!(dict["content"], "done");
    }

    #[test]
    fn test_estimated_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(MemoryRecord::user("abcdefgh").estimated_tokens(), 2);
    }

    #[test]
    fn test_first_message_errors_when_empty() {
        let resp = AgentResponse {
            msgs: vec![],
            terminated: false,
            info: StepInfo::default(),
        };
        assert!(resp.first_message().is_err());
    }
}
