//! # Tools Module
//!
//! Local code-execution toolkit appended to every agent's tool set.

pub mod executor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::traits::{SharedTool, Tool, ToolProvider};
use crate::domain::types::ToolDescriptor;
use executor::CodeExecutor;

pub const EXECUTE_CODE: &str = "execute_code";
pub const EXECUTE_COMMAND: &str = "execute_command";

/// Hands out the local `execute_code` and `execute_command` tools.
pub struct CodeExecutionToolkit {
    executor: Arc<CodeExecutor>,
}

impl CodeExecutionToolkit {
    pub fn new(timeout: Duration, working_dir: Option<PathBuf>) -> Self {
        Self {
            executor: Arc::new(CodeExecutor::new(timeout, working_dir)),
        }
    }

    pub fn get_tools(&self) -> Vec<SharedTool> {
        vec![
            Arc::new(ExecuteCodeTool::new(self.executor.clone())),
            Arc::new(ExecuteCommandTool::new(self.executor.clone())),
        ]
    }
}

#[async_trait]
impl ToolProvider for CodeExecutionToolkit {
    async fn tools(&self) -> Result<Vec<SharedTool>> {
        Ok(self.get_tools())
    }
}

#[derive(Deserialize)]
struct ExecuteCodeArgs {
    code: String,
    #[serde(default = "default_code_type")]
    code_type: String,
}

fn default_code_type() -> String {
    "python".to_string()
}

pub struct ExecuteCodeTool {
    descriptor: ToolDescriptor,
    executor: Arc<CodeExecutor>,
}

impl ExecuteCodeTool {
    fn new(executor: Arc<CodeExecutor>) -> Self {
        let descriptor = ToolDescriptor::new(
            EXECUTE_CODE,
            Some("Execute a given code snippet and return its output.".into()),
            json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The input code to execute."
                    },
                    "code_type": {
                        "type": "string",
                        "description": "The language of the code: python, bash, javascript, ruby or r. Defaults to python."
                    }
                },
                "required": ["code"]
            }),
        );
        Self {
            descriptor,
            executor,
        }
    }
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let args: ExecuteCodeArgs =
            serde_json::from_value(arguments).context("Invalid arguments for execute_code")?;
        self.executor.execute_code(&args.code, &args.code_type).await
    }
}

#[derive(Deserialize)]
struct ExecuteCommandArgs {
    command: String,
}

pub struct ExecuteCommandTool {
    descriptor: ToolDescriptor,
    executor: Arc<CodeExecutor>,
}

impl ExecuteCommandTool {
    fn new(executor: Arc<CodeExecutor>) -> Self {
        let descriptor = ToolDescriptor::new(
            EXECUTE_COMMAND,
            Some("Execute a command in the shell and return its output.".into()),
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The shell command to execute."
                    }
                },
                "required": ["command"]
            }),
        );
        Self {
            descriptor,
            executor,
        }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let args: ExecuteCommandArgs =
            serde_json::from_value(arguments).context("Invalid arguments for execute_command")?;
        self.executor.execute_command(&args.command).await
    }
}
