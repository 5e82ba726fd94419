//! # Strings Module
//!
//! Centralizes prompts and the fixed strings exchanged with the Coral server.

pub mod prompts;
