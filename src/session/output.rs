//! Persistence of the final session output.
//!
//! On a completed session the final code can be written to a named file,
//! optionally alongside a JSON metadata record of the whole run. Write
//! failures are reported to the caller but are never fatal to the session
//! result — the state snapshot is the source of truth.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SessionError;
use crate::session::state::DevelopmentState;

/// Where and how to persist the final output.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Directory the artifacts are written into.
    pub dir: PathBuf,
    /// Filename for the code artifact.
    pub filename: String,
    /// Whether to also write a `<stem>_metadata.json` record.
    pub write_metadata: bool,
}

impl OutputOptions {
    /// Creates options writing `output.py` into `dir`, without metadata.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filename: "output.py".to_string(),
            write_metadata: false,
        }
    }

    /// Sets the code artifact filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Enables the metadata record.
    pub fn with_metadata(mut self) -> Self {
        self.write_metadata = true;
        self
    }
}

/// Metadata record written next to the final code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// The original request.
    pub request: String,
    /// Generation cycles used.
    pub iterations: u32,
    /// Final session status.
    pub status: String,
    /// Final execution record, if any.
    pub execution: Option<crate::sandbox::ExecutionRecord>,
    /// Final review feedback, if any.
    pub review_feedback: Option<String>,
    /// The session's error log.
    pub errors: Vec<String>,
}

impl SessionMetadata {
    /// Builds the metadata record from a final state snapshot.
    pub fn from_state(state: &DevelopmentState) -> Self {
        Self {
            request: state.request.clone(),
            iterations: state.iteration_count,
            status: state.status.to_string(),
            execution: state.execution.clone(),
            review_feedback: state.review.as_ref().map(|r| r.feedback().to_string()),
            errors: state.errors.clone(),
        }
    }
}

/// Writes the final code (and optionally metadata) to disk.
///
/// # Returns
///
/// The path of the written code artifact.
///
/// # Errors
///
/// Returns `SessionError` on any filesystem or serialization failure.
/// Callers treat this as non-fatal.
pub fn persist_final_output(
    state: &DevelopmentState,
    options: &OutputOptions,
) -> Result<PathBuf, SessionError> {
    std::fs::create_dir_all(&options.dir)?;

    let code_path = options.dir.join(&options.filename);
    std::fs::write(&code_path, &state.code)?;
    info!(path = %code_path.display(), "Final code saved");

    if options.write_metadata {
        let metadata_path = options.dir.join(metadata_filename(&options.filename));
        let metadata = SessionMetadata::from_state(state);
        std::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;
        info!(path = %metadata_path.display(), "Metadata saved");
    }

    Ok(code_path)
}

/// `output.py` becomes `output_metadata.json`.
fn metadata_filename(code_filename: &str) -> String {
    let stem = Path::new(code_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| code_filename.to_string());
    format!("{stem}_metadata.json")
}
