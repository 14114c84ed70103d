//! devloop: Iterative LLM-driven code development loop.
//!
//! This library drives a natural-language request through a bounded
//! generate / execute / review cycle: an LLM coder writes code, a Docker
//! sandbox runs it, an LLM reviewer critiques it, and a pure orchestration
//! function decides the next step from the accumulated state.

// Core modules
pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod sandbox;
pub mod session;
pub mod utils;

// Re-export commonly used error types
pub use error::{ConfigError, LlmError, SandboxError, SessionError};
