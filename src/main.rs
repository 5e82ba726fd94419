//! # Main Entry Point
//!
//! Starts the Coral coding agent:
//! - Domain: Configuration and Types
//! - Infrastructure: Coral MCP session, code execution, LLM
//! - Application: Tool catalog, Agent, Drive loop
//!

mod application;
mod domain;
mod infrastructure;
mod strings;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::application::agent::configure_agent;
use crate::application::catalog::build_tool_set;
use crate::application::runner::{DriveLoop, POLL_INTERVAL};
use crate::domain::config::{AppConfig, ProcessEnv};
use crate::infrastructure::mcp::{ConnectionDescriptor, CoralClient};
use crate::infrastructure::tools::CodeExecutionToolkit;

#[derive(Debug, Parser)]
#[command(name = "coral-coder", about = "Coding agent for a Coral multi-agent server")]
struct Cli {
    /// Directory the agent works in (falls back to PROJECT_DIR)
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Where session.log is written
    #[arg(long, default_value = "data")]
    log_dir: PathBuf,

    /// Seconds to wait between agent steps
    #[arg(long, default_value_t = POLL_INTERVAL.as_secs())]
    poll_interval_secs: u64,

    /// Timeout for execute_code / execute_command
    #[arg(long, default_value_t = 120)]
    code_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logging Setup
    let _guard = application::logging::init(&cli.log_dir)?;
    info!("Starting coral-coder...");

    // 2. Load Configuration
    let mut env = ProcessEnv;
    let config = AppConfig::resolve(
        &mut env,
        cli.project_dir,
        Duration::from_secs(cli.poll_interval_secs),
        Duration::from_secs(cli.code_timeout_secs),
    )?;
    info!("Runtime mode: {:?}", config.mode);

    // 3. Connect to Coral
    let descriptor = ConnectionDescriptor::for_coordination(&config.coordination);
    info!("Connecting to Coral Server: {}", descriptor.url);
    info!("Starting MCP client...");
    let coral = CoralClient::connect(descriptor).await?;

    // 4. Tools and Agent
    let toolkit = CodeExecutionToolkit::new(config.code_timeout, config.project_dir.clone());
    let tools = build_tool_set(&coral, &toolkit).await?;
    let agent = configure_agent(&env, tools, config.project_dir.as_deref())?;

    // 5. Drive Loop
    let drive = DriveLoop::new(agent, config.poll_interval);
    tokio::select! {
        result = drive.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            coral.close();
        }
    }

    Ok(())
}
