//! # LLM Module
//!
//! `rig`-backed implementation of the `LanguageModel` trait and the provider factory
//! that turns `ModelSettings` into a model reference.

pub mod client;
pub mod providers;

pub use providers::create_model;
