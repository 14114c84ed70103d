//! Configuration for the development loop.
//!
//! All settings can be loaded from environment variables via
//! [`LoopConfig::from_env`], or built programmatically with the `with_*`
//! setters. Only the API base URL is required; everything else has a
//! working default.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default model used for the coder role.
pub const DEFAULT_CODER_MODEL: &str = "anthropic/claude-sonnet-4.5";
/// Default model used for the reviewer role.
pub const DEFAULT_REVIEWER_MODEL: &str = "anthropic/claude-sonnet-4.5";
/// Default model used for the planner role. A fast, cheap model is enough
/// since the planner never produces code.
pub const DEFAULT_PLANNER_MODEL: &str = "anthropic/claude-haiku-4.5";

/// Configuration for a development session.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Base URL of the OpenAI-compatible completions API.
    pub api_base: String,
    /// Optional bearer token for the API.
    pub api_key: Option<String>,
    /// Model bound to the coder role.
    pub coder_model: String,
    /// Model bound to the reviewer role.
    pub reviewer_model: String,
    /// Model bound to the planner role.
    pub planner_model: String,
    /// Docker image used to execute generated code.
    pub sandbox_image: String,
    /// Host directory bound read-write into the sandbox. Scripts are
    /// materialized here and the final output is written here.
    pub host_script_dir: PathBuf,
    /// Mount point of `host_script_dir` inside the container.
    pub container_script_dir: String,
    /// Default iteration budget when the caller does not specify one.
    pub default_iteration_limit: u32,
}

impl LoopConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads:
    /// - `DEVLOOP_API_BASE` (required)
    /// - `DEVLOOP_API_KEY` (optional)
    /// - `DEVLOOP_CODER_MODEL`, `DEVLOOP_REVIEWER_MODEL`, `DEVLOOP_PLANNER_MODEL`
    /// - `DEVLOOP_SANDBOX_IMAGE` (default "python:3.11-slim")
    /// - `DEVLOOP_HOST_SCRIPT_DIR` (default "./sandbox-scripts")
    /// - `DEVLOOP_CONTAINER_SCRIPT_DIR` (default "/scripts")
    /// - `DEVLOOP_ITERATION_LIMIT` (default 5)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `DEVLOOP_API_BASE` is not
    /// set, or `ConfigError::InvalidValue` if `DEVLOOP_ITERATION_LIMIT`
    /// is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base = std::env::var("DEVLOOP_API_BASE")
            .map_err(|_| ConfigError::MissingEnvVar("DEVLOOP_API_BASE".to_string()))?;

        Ok(Self {
            api_base,
            api_key: std::env::var("DEVLOOP_API_KEY").ok(),
            coder_model: std::env::var("DEVLOOP_CODER_MODEL")
                .unwrap_or_else(|_| DEFAULT_CODER_MODEL.to_string()),
            reviewer_model: std::env::var("DEVLOOP_REVIEWER_MODEL")
                .unwrap_or_else(|_| DEFAULT_REVIEWER_MODEL.to_string()),
            planner_model: std::env::var("DEVLOOP_PLANNER_MODEL")
                .unwrap_or_else(|_| DEFAULT_PLANNER_MODEL.to_string()),
            sandbox_image: std::env::var("DEVLOOP_SANDBOX_IMAGE")
                .unwrap_or_else(|_| "python:3.11-slim".to_string()),
            host_script_dir: std::env::var("DEVLOOP_HOST_SCRIPT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./sandbox-scripts")),
            container_script_dir: std::env::var("DEVLOOP_CONTAINER_SCRIPT_DIR")
                .unwrap_or_else(|_| "/scripts".to_string()),
            default_iteration_limit: parse_iteration_limit(
                std::env::var("DEVLOOP_ITERATION_LIMIT").ok(),
            )?,
        })
    }

    /// Creates a configuration with defaults for the given API base.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: None,
            coder_model: DEFAULT_CODER_MODEL.to_string(),
            reviewer_model: DEFAULT_REVIEWER_MODEL.to_string(),
            planner_model: DEFAULT_PLANNER_MODEL.to_string(),
            sandbox_image: "python:3.11-slim".to_string(),
            host_script_dir: PathBuf::from("./sandbox-scripts"),
            container_script_dir: "/scripts".to_string(),
            default_iteration_limit: 5,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the coder model.
    pub fn with_coder_model(mut self, model: impl Into<String>) -> Self {
        self.coder_model = model.into();
        self
    }

    /// Sets the reviewer model.
    pub fn with_reviewer_model(mut self, model: impl Into<String>) -> Self {
        self.reviewer_model = model.into();
        self
    }

    /// Sets the sandbox image.
    pub fn with_sandbox_image(mut self, image: impl Into<String>) -> Self {
        self.sandbox_image = image.into();
        self
    }

    /// Sets the host script directory.
    pub fn with_host_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.host_script_dir = dir.into();
        self
    }

    /// Sets the default iteration budget.
    pub fn with_default_iteration_limit(mut self, limit: u32) -> Self {
        self.default_iteration_limit = limit;
        self
    }
}

/// Parses `DEVLOOP_ITERATION_LIMIT`; absence means the built-in default.
fn parse_iteration_limit(raw: Option<String>) -> Result<u32, ConfigError> {
    match raw {
        None => Ok(5),
        Some(raw) => match raw.parse::<u32>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(ConfigError::InvalidValue {
                key: "DEVLOOP_ITERATION_LIMIT".to_string(),
                message: format!("expected a positive integer, got '{raw}'"),
            }),
        },
    }
}
