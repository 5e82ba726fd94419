//! # MCP Module
//!
//! Model Context Protocol client for the Coral server.
//! Includes the session client and the remote tool handles built from its catalog.

pub mod client;
pub mod tools;

pub use client::{ConnectionDescriptor, CoralClient};
