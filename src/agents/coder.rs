//! Code agent.
//!
//! Assembles a context from the request and whatever prior artifacts exist
//! (code, execution record, review feedback), picks the first-draft or
//! fix-up template, and invokes the coder role. The completion's first
//! fenced code block replaces the state's code atomically, clearing stale
//! execution and review results. A completion failure touches nothing but
//! the error log.

use tracing::{info, warn};

use crate::llm::{CompletionPort, Role};
use crate::prompts::{CODER_FIX_PROMPT, CODER_INITIAL_PROMPT};
use crate::session::state::DevelopmentState;
use crate::utils::extract_code_block;

/// Wraps the completion port with the coder role.
pub struct CodeAgent<'a> {
    port: &'a dyn CompletionPort,
    initial_prompt: String,
    fix_prompt: String,
}

impl<'a> CodeAgent<'a> {
    /// Creates a code agent with the default prompts.
    pub fn new(port: &'a dyn CompletionPort) -> Self {
        Self {
            port,
            initial_prompt: CODER_INITIAL_PROMPT.to_string(),
            fix_prompt: CODER_FIX_PROMPT.to_string(),
        }
    }

    /// Overrides the first-draft prompt. Must contain `{context}`.
    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = prompt.into();
        self
    }

    /// Overrides the fix-up prompt. Must contain `{context}`.
    pub fn with_fix_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.fix_prompt = prompt.into();
        self
    }

    /// Generates or fixes code, updating the state in place.
    ///
    /// On success the new code replaces the old one through
    /// [`DevelopmentState::replace_code`], which clears the execution
    /// record and review outcome and increments the iteration count. On
    /// failure the state is unchanged apart from an `errors` append, so
    /// the orchestrator re-decides on the stale state.
    pub async fn generate(&self, state: &mut DevelopmentState) {
        let context = build_context(state);

        let template = if state.code.is_empty() {
            &self.initial_prompt
        } else {
            &self.fix_prompt
        };
        let prompt = template.replace("{context}", &context);

        match self.port.complete(Role::Coder, &prompt).await {
            Ok(completion) => {
                let code = extract_code_block(&completion);
                info!(bytes = code.len(), "Coder produced a new artifact");
                state.replace_code(code);
            }
            Err(e) => {
                warn!("Coder error: {e}");
                state.record_error(format!("Coder error: {e}"));
            }
        }
    }
}

/// Concatenates the request with whatever prior artifacts exist.
fn build_context(state: &DevelopmentState) -> String {
    let mut context = format!("Original Request: {}\n", state.request);

    if !state.code.is_empty() {
        context.push_str(&format!("\nCurrent Code:\n{}\n", state.code));
    }

    if let Some(execution) = &state.execution {
        context.push_str(&format!(
            "\nExecution Result (exit status {}):\n{}\n",
            execution.exit_status, execution.output
        ));
    }

    if let Some(review) = &state.review {
        context.push_str(&format!("\nReview Feedback:\n{}\n", review.feedback()));
    }

    context
}
