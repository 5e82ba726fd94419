//! # Coral MCP Client
//!
//! Opens a long-lived MCP session with the Coral server over the SSE transport
//! and exposes the server's tool catalog.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rmcp::{
    RoleClient, ServiceExt,
    model::{ClientCapabilities, ClientInfo, Implementation},
    service::RunningService,
    transport::{SseClientTransport, sse_client::SseClientConfig},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::config::CoordinationParams;
use crate::domain::traits::{SharedTool, ToolProvider};
use crate::infrastructure::mcp::tools::RemoteTool;

/// Overall and read timeout for the Coral session.
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(3_000_000);

pub type McpSession = RunningService<RoleClient, ClientInfo>;

/// Everything needed to open the Coral session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub url: String,
    pub timeout: Duration,
    pub sse_read_timeout: Duration,
    /// Cancel the session when the client is closed.
    pub terminate_on_close: bool,
}

impl ConnectionDescriptor {
    pub fn for_coordination(params: &CoordinationParams) -> Self {
        Self {
            url: params.connection_url(),
            timeout: TRANSPORT_TIMEOUT,
            sse_read_timeout: TRANSPORT_TIMEOUT,
            terminate_on_close: true,
        }
    }
}

/// MCP client connected to a Coral server.
pub struct CoralClient {
    session: Arc<McpSession>,
    descriptor: ConnectionDescriptor,
}

impl CoralClient {
    /// Connect and complete the MCP handshake. No retries.
    pub async fn connect(descriptor: ConnectionDescriptor) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(descriptor.timeout)
            .read_timeout(descriptor.sse_read_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let transport = SseClientTransport::start_with_client(
            http,
            SseClientConfig {
                sse_endpoint: descriptor.url.clone().into(),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to open SSE stream to {}", descriptor.url))?;

        let session = client_info()
            .serve(transport)
            .await
            .context("MCP handshake with Coral server failed")?;

        if let Some(server) = session.peer_info() {
            info!(
                "Connected to {} {}",
                server.server_info.name, server.server_info.version
            );
        }

        Ok(Self {
            session: Arc::new(session),
            descriptor,
        })
    }

    /// Fetch the full, unfiltered tool catalog.
    pub async fn list_tools(&self) -> Result<Vec<SharedTool>> {
        let tools = self
            .session
            .list_all_tools()
            .await
            .context("Failed to list tools from Coral server")?;
        debug!("Coral server exposes {} tools", tools.len());

        Ok(tools
            .into_iter()
            .map(|tool| Arc::new(RemoteTool::from_mcp(tool, self.session.clone())) as SharedTool)
            .collect())
    }

    /// Cancel the session if the descriptor asks for it.
    pub fn close(self) {
        if self.descriptor.terminate_on_close {
            info!("Closing Coral session");
            self.session.cancellation_token().cancel();
        }
    }
}

#[async_trait]
impl ToolProvider for CoralClient {
    async fn tools(&self) -> Result<Vec<SharedTool>> {
        self.list_tools().await
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}
