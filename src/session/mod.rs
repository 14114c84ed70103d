//! The development session driver.
//!
//! Owns one [`DevelopmentState`] for the duration of a `develop` call and
//! alternates between the pure orchestrator decision and the side-effecting
//! dispatch it selects, until the decision is `Done`. All recoverable agent
//! failures land in the state's error log; only a driver-level failure (a
//! bad budget, or a stalled loop) ends the session with `Failed`.

pub mod orchestrator;
pub mod output;
pub mod state;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::agents::{CodeAgent, ReviewAgent};
use crate::error::SessionError;
use crate::llm::CompletionPort;
use crate::sandbox::{ExecutionRecord, Executor};

pub use orchestrator::decide;
pub use output::{persist_final_output, OutputOptions, SessionMetadata};
pub use state::{DevelopmentState, PendingAgent, SessionStatus};

/// Consecutive same-dispatch failures tolerated before the session is
/// declared stalled. Only dispatches that leave the state's routing inputs
/// untouched count; any progress resets the counter.
const MAX_CONSECUTIVE_STALLS: u32 = 3;

/// Drives one request through the generate / execute / review loop.
pub struct DevelopmentSession {
    port: Arc<dyn CompletionPort>,
    executor: Arc<dyn Executor>,
    output: Option<OutputOptions>,
    initial_prompt: Option<String>,
    fix_prompt: Option<String>,
    review_prompt: Option<String>,
}

impl DevelopmentSession {
    /// Creates a session over the given completion port and executor.
    pub fn new(port: Arc<dyn CompletionPort>, executor: Arc<dyn Executor>) -> Self {
        Self {
            port,
            executor,
            output: None,
            initial_prompt: None,
            fix_prompt: None,
            review_prompt: None,
        }
    }

    /// Persists the final code (and optional metadata) after each run.
    pub fn with_output(mut self, options: OutputOptions) -> Self {
        self.output = Some(options);
        self
    }

    /// Overrides the first-draft prompt. Must contain `{context}`.
    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = Some(prompt.into());
        self
    }

    /// Overrides the fix-up prompt. Must contain `{context}`.
    pub fn with_fix_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.fix_prompt = Some(prompt.into());
        self
    }

    /// Overrides the review prompt. Must contain `{code}`.
    pub fn with_review_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.review_prompt = Some(prompt.into());
        self
    }

    /// Runs the full development loop for `request`.
    ///
    /// Always returns a final state with a terminal status. Driver-level
    /// failures (an invalid budget, a stalled loop) are surfaced as
    /// `status == Failed` with the cause appended to `errors`, never as a
    /// panic or a hung call.
    pub async fn develop(&self, request: &str, iteration_limit: u32) -> DevelopmentState {
        let mut state = DevelopmentState::new(request, iteration_limit);

        if iteration_limit == 0 {
            let e = SessionError::InvalidIterationLimit(iteration_limit);
            error!("{e}");
            state.record_error(e.to_string());
            state.status = SessionStatus::Failed;
            return state;
        }

        info!(request, iteration_limit, "Development session started");

        let coder = self.code_agent();
        let reviewer = self.review_agent();

        // A dispatch that fails without changing any routing input would
        // make the orchestrator re-select it forever, so such repeats are
        // bounded explicitly.
        let mut consecutive_stalls = 0u32;

        loop {
            state = decide(state);

            match state.pending_agent {
                PendingAgent::Done => break,
                PendingAgent::Code => {
                    let iterations_before = state.iteration_count;
                    coder.generate(&mut state).await;
                    if state.iteration_count == iterations_before {
                        consecutive_stalls += 1;
                    } else {
                        consecutive_stalls = 0;
                    }
                }
                PendingAgent::Execute => {
                    match self.executor.run(&state.code).await {
                        Ok(record) => state.execution = Some(record),
                        Err(e) => {
                            warn!("Sandbox failure: {e}");
                            state.record_error(format!("Sandbox failure: {e}"));
                            state.execution =
                                Some(ExecutionRecord::infrastructure_failure(e.to_string()));
                        }
                    }
                    // Either arm records an execution result, so routing
                    // inputs always advance here.
                    consecutive_stalls = 0;
                }
                PendingAgent::Review => {
                    let had_review = state.review.is_some();
                    reviewer.review(&mut state).await;
                    if state.review.is_some() != had_review {
                        consecutive_stalls = 0;
                    } else {
                        consecutive_stalls += 1;
                    }
                }
                PendingAgent::None => {
                    // The orchestrator always selects an agent or Done.
                    warn!("Orchestrator made no selection, ending session");
                    break;
                }
            }

            if consecutive_stalls >= MAX_CONSECUTIVE_STALLS {
                let e = SessionError::Stalled {
                    agent: state.pending_agent.to_string(),
                    failures: consecutive_stalls,
                };
                error!("{e}");
                state.record_error(e.to_string());
                state.status = SessionStatus::Failed;
                break;
            }
        }

        info!(
            status = %state.status,
            iterations = state.iteration_count,
            errors = state.errors.len(),
            "Development session finished"
        );

        if let Some(options) = &self.output {
            if state.status == SessionStatus::Completed && !state.code.is_empty() {
                if let Err(e) = persist_final_output(&state, options) {
                    warn!("Failed to persist final output: {e}");
                    state.record_error(format!("Failed to persist final output: {e}"));
                }
            }
        }

        state
    }

    fn code_agent(&self) -> CodeAgent<'_> {
        let mut agent = CodeAgent::new(self.port.as_ref());
        if let Some(prompt) = &self.initial_prompt {
            agent = agent.with_initial_prompt(prompt.clone());
        }
        if let Some(prompt) = &self.fix_prompt {
            agent = agent.with_fix_prompt(prompt.clone());
        }
        agent
    }

    fn review_agent(&self) -> ReviewAgent<'_> {
        let mut agent = ReviewAgent::new(self.port.as_ref());
        if let Some(prompt) = &self.review_prompt {
            agent = agent.with_prompt(prompt.clone());
        }
        agent
    }
}
