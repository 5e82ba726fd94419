//! # Application Layer
//!
//! Orchestration of the coding agent: tool catalog assembly, tool descriptions,
//! agent configuration and the drive loop.

pub mod agent;
pub mod catalog;
pub mod formatter;
pub mod logging;
pub mod runner;
