//! # Drive Loop
//!
//! Sends the same instruction to the agent forever, logging each response
//! and pausing a fixed interval between iterations. Any step failure ends the loop.

use anyhow::Result;
use std::time::Duration;
use tracing::info;

use crate::domain::traits::AgentSession;
use crate::domain::types::AgentResponse;
use crate::strings::prompts::USER_MESSAGE;

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct DriveLoop<A> {
    agent: A,
    interval: Duration,
}

impl<A: AgentSession> DriveLoop<A> {
    pub fn new(agent: A, interval: Duration) -> Self {
        Self { agent, interval }
    }

    /// One step: send the fixed instruction and log the response and its first message.
    pub async fn run_iteration(&mut self) -> Result<AgentResponse> {
        let resp = self.agent.step(USER_MESSAGE).await?;
        info!("{:?}", resp);
        let first = resp.first_message()?;
        info!("{}", first.to_dict());
        Ok(resp)
    }

    /// Only returns on error.
    pub async fn run(mut self) -> Result<()> {
        loop {
            self.run_iteration().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}
