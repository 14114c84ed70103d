//! Error types for devloop operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions (completion port)
//! - Sandbox creation and execution
//! - Configuration loading
//! - Session-level failures

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No model bound for role '{0}'")]
    MissingModel(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Completion contained no choices")]
    EmptyCompletion,
}

/// Errors that can occur while creating or running a sandbox.
///
/// These describe infrastructure failures: the daemon being unreachable,
/// a container that could not be created, logs that could not be fetched.
/// A non-zero exit from the program under test is not an error here — it
/// is reported through the exit status of the execution record.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Docker daemon not available: {0}")]
    DaemonUnavailable(String),

    #[error("Failed to materialize script '{path}': {reason}")]
    ScriptWriteFailed { path: String, reason: String },

    #[error("Container create failed: {0}")]
    CreateFailed(String),

    #[error("Container run failed: {0}")]
    RunFailed(String),

    #[error("Failed to fetch container logs: {0}")]
    LogsFailed(String),

    #[error("Image pull failed: {0}")]
    PullFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors that can terminate a development session abnormally.
///
/// Agent-level LLM and sandbox failures never reach this type: the session
/// confines them to the state's error log and keeps looping.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Iteration limit must be at least 1, got {0}")]
    InvalidIterationLimit(u32),

    #[error("Session stalled: {failures} consecutive {agent} failures without progress")]
    Stalled { agent: String, failures: u32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
