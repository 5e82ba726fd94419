//! # Domain Traits
//!
//! Capability handles the application layer is written against:
//! environment access, tools, tool providers, the language model and the agent session.
//! Infrastructure supplies the real implementations; tests supply fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::types::{AgentResponse, ModelRequest, ModelTurn, ToolDescriptor};

/// Read access to process configuration values.
pub trait EnvSource {
    /// Look up a variable. Unset variables are `None`.
    fn var(&self, key: &str) -> Option<String>;

    /// Merge a local `.env` file into this source.
    /// Returns the loaded file's path, or `None` if there was no file.
    fn load_dotenv(&mut self) -> Result<Option<PathBuf>>;
}

/// A callable the agent may invoke during a step.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    /// Invoke the tool with a JSON object of arguments and return its textual result.
    async fn call(&self, arguments: Value) -> Result<String>;
}

pub type SharedTool = Arc<dyn Tool>;

/// Anything that can hand out a set of tools (a remote catalog, a local toolkit).
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn tools(&self) -> Result<Vec<SharedTool>>;
}

/// A chat-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn>;
}

/// An agent that answers one instruction per step.
#[async_trait]
pub trait AgentSession: Send {
    async fn step(&mut self, input: &str) -> Result<AgentResponse>;
}
