//! Docker API wrapper using the bollard crate.
//!
//! Thin lifecycle layer for throwaway execution containers: create with a
//! single bind mount, start, wait for exit, collect combined logs, remove.

use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;

use crate::error::SandboxError;

/// Configuration for a single-shot execution container.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Unique name for the container.
    pub name: String,
    /// Docker image to use.
    pub image: String,
    /// Command to run in the container.
    pub cmd: Vec<String>,
    /// The one host:container bind mount, read-write.
    pub bind: String,
    /// Network mode (e.g., "none", "bridge").
    pub network_mode: String,
}

/// Docker client wrapper for sandbox container operations.
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Creates a new Docker client connecting to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns `SandboxError::DaemonUnavailable` if the daemon is not accessible.
    pub fn new() -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| SandboxError::DaemonUnavailable(format!("Failed to connect: {e}")))?;

        Ok(Self { docker })
    }

    /// Creates a new Docker client from an existing bollard instance.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    /// Creates a container for the given run spec.
    ///
    /// # Returns
    ///
    /// The container ID on success.
    pub async fn create_container(&self, spec: &RunSpec) -> Result<String, SandboxError> {
        let host_config = HostConfig {
            binds: Some(vec![spec.bind.clone()]),
            network_mode: Some(spec.network_mode.clone()),
            ..Default::default()
        };

        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            host_config: Some(host_config),
            attach_stdin: Some(false),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| SandboxError::CreateFailed(format!("Failed to create container: {e}")))?;

        Ok(response.id)
    }

    /// Starts a container by ID.
    pub async fn start_container(&self, id: &str) -> Result<(), SandboxError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| SandboxError::RunFailed(format!("Failed to start container: {e}")))?;

        Ok(())
    }

    /// Waits for a container to finish executing.
    ///
    /// # Returns
    ///
    /// The exit code of the container's main process.
    pub async fn wait_container(&self, id: &str) -> Result<i64, SandboxError> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(id, Some(options));

        if let Some(result) = stream.next().await {
            // A non-zero exit surfaces as Err from bollard but still carries
            // the status; the program failing is not an infrastructure error.
            return match result {
                Ok(wait_response) => Ok(wait_response.status_code),
                Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => Ok(code),
                Err(e) => Err(SandboxError::RunFailed(format!(
                    "Error waiting for container: {e}"
                ))),
            };
        }

        Err(SandboxError::RunFailed(
            "Container did not exit normally".to_string(),
        ))
    }

    /// Gets combined stdout and stderr logs from a container.
    pub async fn get_logs(&self, id: &str) -> Result<String, SandboxError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            ..Default::default()
        };

        let mut logs = self.docker.logs(id, Some(options));
        let mut output = String::new();

        while let Some(chunk) = logs.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    output.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(SandboxError::LogsFailed(format!(
                        "Error reading logs: {e}"
                    )));
                }
            }
        }

        Ok(output)
    }

    /// Removes a container by ID, forcing removal if it is still running.
    pub async fn remove_container(&self, id: &str) -> Result<(), SandboxError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true, // Remove anonymous volumes
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| SandboxError::RunFailed(format!("Failed to remove container: {e}")))?;

        Ok(())
    }

    /// Pulls a Docker image from a registry.
    pub async fn pull_image(&self, image: &str) -> Result<(), SandboxError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            result.map_err(|e| SandboxError::PullFailed(format!("Failed to pull image: {e}")))?;
        }

        Ok(())
    }

    /// Checks if an image exists locally.
    pub async fn image_exists(&self, image: &str) -> bool {
        self.docker.inspect_image(image).await.is_ok()
    }
}
