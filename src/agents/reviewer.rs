//! Review agent.
//!
//! Sends the current code to the reviewer role and classifies the free-text
//! feedback into a tagged [`ReviewOutcome`] at the agent boundary. The
//! orchestrator routes on the variant, never on substring searches of its
//! own, and a failed review is `Unknown` — routed like a failure, never
//! silently treated as approval.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::{CompletionPort, Role};
use crate::prompts::{APPROVED_MARKER, ISSUES_MARKER, REVIEW_PROMPT};
use crate::session::state::DevelopmentState;

/// Classified outcome of a review pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewOutcome {
    /// The reviewer approved the code.
    Approved {
        /// Verbatim reviewer feedback.
        feedback: String,
    },
    /// The reviewer found concrete problems.
    IssuesFound {
        /// Verbatim reviewer feedback.
        feedback: String,
    },
    /// No usable verdict: the review call failed or the response carried
    /// neither marker.
    Unknown {
        /// Why no verdict could be extracted.
        reason: String,
    },
}

impl ReviewOutcome {
    /// Creates an approved outcome.
    pub fn approved(feedback: impl Into<String>) -> Self {
        Self::Approved {
            feedback: feedback.into(),
        }
    }

    /// Creates an issues-found outcome.
    pub fn issues_found(feedback: impl Into<String>) -> Self {
        Self::IssuesFound {
            feedback: feedback.into(),
        }
    }

    /// Creates an unknown outcome.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    /// Classifies raw reviewer feedback by its markers, case-insensitively.
    ///
    /// "issues" beats "approved" when both appear, since a response like
    /// "approved except for these issues" is not an approval.
    pub fn classify(feedback: &str) -> Self {
        let lower = feedback.to_lowercase();
        if lower.contains(ISSUES_MARKER) {
            Self::issues_found(feedback)
        } else if lower.contains(APPROVED_MARKER) {
            Self::approved(feedback)
        } else {
            Self::unknown(format!(
                "Review response carried no verdict marker: {}",
                truncate(feedback, 120)
            ))
        }
    }

    /// The feedback or reason text carried by this outcome.
    pub fn feedback(&self) -> &str {
        match self {
            Self::Approved { feedback } | Self::IssuesFound { feedback } => feedback,
            Self::Unknown { reason } => reason,
        }
    }

    /// Whether this outcome approves the code.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Wraps the completion port with the reviewer role.
pub struct ReviewAgent<'a> {
    port: &'a dyn CompletionPort,
    prompt: String,
}

impl<'a> ReviewAgent<'a> {
    /// Creates a review agent with the default prompt.
    pub fn new(port: &'a dyn CompletionPort) -> Self {
        Self {
            port,
            prompt: REVIEW_PROMPT.to_string(),
        }
    }

    /// Overrides the review prompt. Must contain a `{code}` placeholder.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Reviews the current code and stores the outcome on the state.
    ///
    /// A completion failure is appended to the error log and stored as an
    /// `Unknown` outcome so the orchestrator treats it like a failure.
    pub async fn review(&self, state: &mut DevelopmentState) {
        if state.code.is_empty() {
            warn!("No code to review");
            state.record_error("Reviewer invoked with no code".to_string());
            return;
        }

        let prompt = self.prompt.replace("{code}", &state.code);

        match self.port.complete(Role::Reviewer, &prompt).await {
            Ok(response) => {
                let outcome = ReviewOutcome::classify(response.trim());
                match &outcome {
                    ReviewOutcome::Approved { .. } => info!("Code approved by review"),
                    ReviewOutcome::IssuesFound { .. } => info!("Review found issues"),
                    ReviewOutcome::Unknown { reason } => {
                        warn!("Review verdict unclear: {reason}");
                        state.record_error(format!("Reviewer verdict unclear: {reason}"));
                    }
                }
                state.review = Some(outcome);
            }
            Err(e) => {
                warn!("Reviewer error: {e}");
                state.record_error(format!("Reviewer error: {e}"));
                state.review = Some(ReviewOutcome::unknown(format!("Review failed: {e}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::LlmError;

    struct FixedPort(Result<String, String>);

    #[async_trait]
    impl CompletionPort for FixedPort {
        async fn complete(&self, _role: Role, _prompt: &str) -> Result<String, LlmError> {
            self.0
                .clone()
                .map_err(|e| LlmError::RequestFailed(e))
        }
    }

    #[test]
    fn test_classify_approved() {
        let outcome = ReviewOutcome::classify("APPROVED: Code meets standards.");
        assert!(outcome.is_approved());
        assert!(outcome.feedback().contains("meets standards"));
    }

    #[test]
    fn test_classify_issues() {
        let outcome = ReviewOutcome::classify("ISSUES FOUND:\n1. Bad naming");
        assert!(matches!(outcome, ReviewOutcome::IssuesFound { .. }));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert!(ReviewOutcome::classify("approved: fine").is_approved());
        assert!(matches!(
            ReviewOutcome::classify("Some issues remain"),
            ReviewOutcome::IssuesFound { .. }
        ));
    }

    #[test]
    fn test_issues_beats_approved() {
        let outcome = ReviewOutcome::classify("Approved, but issues: long lines");
        assert!(matches!(outcome, ReviewOutcome::IssuesFound { .. }));
    }

    #[test]
    fn test_classify_no_marker_is_unknown() {
        let outcome = ReviewOutcome::classify("The code is quite nice overall.");
        assert!(matches!(outcome, ReviewOutcome::Unknown { .. }));
    }

    #[tokio::test]
    async fn test_review_stores_classified_outcome() {
        let port = FixedPort(Ok("APPROVED: looks good".to_string()));
        let agent = ReviewAgent::new(&port);

        let mut state = DevelopmentState::new("req", 5);
        state.code = "print(1)".to_string();
        agent.review(&mut state).await;

        assert!(state.review.as_ref().unwrap().is_approved());
        assert!(state.errors.is_empty());
    }

    #[tokio::test]
    async fn test_review_failure_is_unknown_not_approval() {
        let port = FixedPort(Err("connection refused".to_string()));
        let agent = ReviewAgent::new(&port);

        let mut state = DevelopmentState::new("req", 5);
        state.code = "print(1)".to_string();
        agent.review(&mut state).await;

        let outcome = state.review.as_ref().unwrap();
        assert!(matches!(outcome, ReviewOutcome::Unknown { .. }));
        assert!(!outcome.is_approved());
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_review_with_no_code_records_error() {
        let port = FixedPort(Ok("APPROVED".to_string()));
        let agent = ReviewAgent::new(&port);

        let mut state = DevelopmentState::new("req", 5);
        agent.review(&mut state).await;

        assert!(state.review.is_none());
        assert_eq!(state.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_prompt_receives_code() {
        struct CapturePort(std::sync::Mutex<String>);

        #[async_trait]
        impl CompletionPort for CapturePort {
            async fn complete(&self, _role: Role, prompt: &str) -> Result<String, LlmError> {
                *self.0.lock().unwrap() = prompt.to_string();
                Ok("APPROVED".to_string())
            }
        }

        let port = CapturePort(std::sync::Mutex::new(String::new()));
        let agent = ReviewAgent::new(&port).with_prompt("Check this:\n{code}");

        let mut state = DevelopmentState::new("req", 5);
        state.code = "print(42)".to_string();
        agent.review(&mut state).await;

        let seen = port.0.lock().unwrap().clone();
        assert_eq!(seen, "Check this:\nprint(42)");
    }
}
