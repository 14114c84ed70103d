//! Sandboxed execution of generated code.
//!
//! The executor materializes a code blob as a uniquely named script inside
//! one bound host directory, runs it in a fresh container, and reports the
//! exit status and combined output. The container and the script are
//! removed after every call, whether the run succeeded or not.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LoopConfig;
use crate::error::SandboxError;
use crate::sandbox::docker::{DockerClient, RunSpec};

/// Result of one sandboxed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Exit status of the program. `-1` marks an infrastructure failure
    /// (the sandbox itself could not run), distinct from the program
    /// exiting non-zero.
    pub exit_status: i64,
    /// Combined stdout and stderr, decoded as UTF-8.
    pub output: String,
    /// When the result was captured.
    pub captured_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Creates a record for a completed program run.
    pub fn completed(exit_status: i64, output: impl Into<String>) -> Self {
        Self {
            exit_status,
            output: output.into(),
            captured_at: Utc::now(),
        }
    }

    /// Creates a synthetic record for a sandbox infrastructure failure.
    pub fn infrastructure_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            exit_status: -1,
            output: diagnostic.into(),
            captured_at: Utc::now(),
        }
    }

    /// Whether the program exited cleanly.
    pub fn passed(&self) -> bool {
        self.exit_status == 0
    }
}

/// Capability to run an arbitrary code blob in isolation.
///
/// The session depends only on this trait; tests substitute an in-memory
/// fake. Errors are infrastructure failures — a program's own non-zero
/// exit is a successful `run` with a non-zero status in the record.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs `code` to completion and returns the captured result.
    async fn run(&self, code: &str) -> Result<ExecutionRecord, SandboxError>;
}

/// Docker-backed executor.
///
/// Each invocation gets a fresh script name and a fresh container, so
/// concurrent runs never collide on the shared host directory.
pub struct DockerSandboxExecutor {
    client: DockerClient,
    image: String,
    host_script_dir: PathBuf,
    container_script_dir: String,
}

impl DockerSandboxExecutor {
    /// Creates an executor from a loop configuration, connecting to the
    /// local Docker daemon.
    pub fn from_config(config: &LoopConfig) -> Result<Self, SandboxError> {
        Ok(Self {
            client: DockerClient::new()?,
            image: config.sandbox_image.clone(),
            host_script_dir: config.host_script_dir.clone(),
            container_script_dir: config.container_script_dir.clone(),
        })
    }

    /// Creates an executor with an explicit Docker client.
    pub fn new(
        client: DockerClient,
        image: impl Into<String>,
        host_script_dir: impl Into<PathBuf>,
        container_script_dir: impl Into<String>,
    ) -> Self {
        Self {
            client,
            image: image.into(),
            host_script_dir: host_script_dir.into(),
            container_script_dir: container_script_dir.into(),
        }
    }

    /// Materializes the script on the host and returns its path and the
    /// path it will have inside the container.
    fn materialize(&self, code: &str, token: &str) -> Result<(PathBuf, String), SandboxError> {
        std::fs::create_dir_all(&self.host_script_dir)?;

        let script_name = format!("run_{token}.py");
        let host_path = self.host_script_dir.join(&script_name);

        std::fs::write(&host_path, code).map_err(|e| SandboxError::ScriptWriteFailed {
            path: host_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let container_path = format!(
            "{}/{}",
            self.container_script_dir.trim_end_matches('/'),
            script_name
        );

        Ok((host_path, container_path))
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<ExecutionRecord, SandboxError> {
        if !self.client.image_exists(&spec.image).await {
            self.client.pull_image(&spec.image).await?;
        }

        let id = self.client.create_container(spec).await?;

        // From here on the container must be removed on every exit path.
        let result = self.drive_to_completion(&id).await;

        if let Err(e) = self.client.remove_container(&id).await {
            warn!(container = %id, "Failed to remove container: {e}");
        }

        result
    }

    async fn drive_to_completion(&self, id: &str) -> Result<ExecutionRecord, SandboxError> {
        self.client.start_container(id).await?;
        let exit_status = self.client.wait_container(id).await?;
        let output = self.client.get_logs(id).await?;

        Ok(ExecutionRecord::completed(exit_status, output))
    }
}

#[async_trait]
impl Executor for DockerSandboxExecutor {
    async fn run(&self, code: &str) -> Result<ExecutionRecord, SandboxError> {
        let token = Uuid::new_v4().simple().to_string()[..8].to_string();
        let (host_path, container_path) = self.materialize(code, &token)?;

        let host_dir = self
            .host_script_dir
            .canonicalize()
            .unwrap_or_else(|_| self.host_script_dir.clone());

        let spec = RunSpec {
            name: format!("devloop-run-{token}"),
            image: self.image.clone(),
            cmd: vec!["python3".to_string(), container_path],
            bind: format!(
                "{}:{}",
                host_dir.display(),
                self.container_script_dir.trim_end_matches('/')
            ),
            network_mode: "bridge".to_string(),
        };

        debug!(container = %spec.name, image = %spec.image, "Running code in sandbox");

        let result = self.run_container(&spec).await;

        // The transient script is removed regardless of how the run went.
        if let Err(e) = std::fs::remove_file(&host_path) {
            warn!(path = %host_path.display(), "Failed to remove script: {e}");
        }

        match &result {
            Ok(record) => {
                info!(
                    exit_status = record.exit_status,
                    output_bytes = record.output.len(),
                    "Sandbox run finished"
                );
            }
            Err(e) => {
                warn!("Sandbox infrastructure failure: {e}");
            }
        }

        result
    }
}
