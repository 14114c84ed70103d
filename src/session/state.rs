//! Development state threaded through one session.
//!
//! One mutable record, owned exclusively by the session for the duration
//! of a `develop` call. Code replacement goes through [`DevelopmentState::replace_code`]
//! so stale execution and review results can never outlive the code they
//! describe.

use serde::{Deserialize, Serialize};

use crate::agents::ReviewOutcome;
use crate::sandbox::ExecutionRecord;

/// Overall status of a development session.
///
/// The status moves monotonically toward a terminal value and never
/// regresses. Budget exhaustion terminates as `Completed`: the session
/// always returns best-effort code rather than failing on a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Created, no work done yet.
    Starting,
    /// At least one generation cycle has begun.
    InProgress,
    /// Terminal: loop finished (approval or budget exhaustion).
    Completed,
    /// Terminal: the driver itself failed.
    Failed,
}

impl SessionStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Starting => write!(f, "starting"),
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The next component the orchestrator has selected to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAgent {
    /// Nothing selected yet.
    None,
    /// Generate or fix code.
    Code,
    /// Run the current code in the sandbox.
    Execute,
    /// Review the current code.
    Review,
    /// Terminate the loop.
    Done,
}

impl std::fmt::Display for PendingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingAgent::None => write!(f, "none"),
            PendingAgent::Code => write!(f, "code"),
            PendingAgent::Execute => write!(f, "execute"),
            PendingAgent::Review => write!(f, "review"),
            PendingAgent::Done => write!(f, "done"),
        }
    }
}

/// The single mutable record threaded through every step of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentState {
    /// The original natural-language request. Immutable after creation.
    pub request: String,
    /// Current best-known code artifact, possibly empty.
    pub code: String,
    /// Result of the last run of `code`. Present only after a run,
    /// cleared whenever the code changes.
    pub execution: Option<ExecutionRecord>,
    /// Outcome of the last review of `code`, cleared whenever the code
    /// changes. Carries the reviewer's verbatim feedback.
    pub review: Option<ReviewOutcome>,
    /// Number of generation cycles begun. Incremented exactly once per
    /// code-generation step (and once at bootstrap).
    pub iteration_count: u32,
    /// Generation budget, fixed at session start.
    pub iteration_limit: u32,
    /// Session status, monotonic toward a terminal value.
    pub status: SessionStatus,
    /// Next component to run, set by the orchestrator.
    pub pending_agent: PendingAgent,
    /// Append-only log of recoverable failures.
    pub errors: Vec<String>,
}

impl DevelopmentState {
    /// Seeds a fresh state for `request` with the given budget.
    pub fn new(request: impl Into<String>, iteration_limit: u32) -> Self {
        Self {
            request: request.into(),
            code: String::new(),
            execution: None,
            review: None,
            iteration_count: 0,
            iteration_limit,
            status: SessionStatus::Starting,
            pending_agent: PendingAgent::None,
            errors: Vec::new(),
        }
    }

    /// Replaces the code artifact.
    ///
    /// Atomically clears the execution record and review outcome (they
    /// describe the old code) and increments the iteration count. This is
    /// the only place the iteration count moves after bootstrap.
    pub fn replace_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.execution = None;
        self.review = None;
        self.iteration_count += 1;
    }

    /// Records a recoverable failure.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Whether the last known execution of the current code passed.
    pub fn execution_passed(&self) -> bool {
        self.execution.as_ref().is_some_and(|r| r.passed())
    }
}
