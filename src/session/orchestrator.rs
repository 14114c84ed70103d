//! The orchestration state machine.
//!
//! [`decide`] is a pure, total, deterministic transition function over the
//! development state: given the accumulated state it returns the updated
//! state with the next agent to run. No agent is invoked here and nothing
//! outside the state value is touched, which makes the whole routing table
//! unit-testable in isolation.
//!
//! Termination: rule 2 bounds the number of generation cycles by the
//! iteration limit, and only the code agent (via `replace_code`) increments
//! the iteration count. Every non-terminating cycle eventually passes
//! through a generation step, so the loop is finite.

use tracing::info;

use crate::agents::ReviewOutcome;
use crate::session::state::{DevelopmentState, PendingAgent, SessionStatus};

/// Applies the transition table to `state`.
///
/// Rules are evaluated in order; the first match wins:
/// 1. Bootstrap: nothing has run yet → start the first generation cycle.
/// 2. Budget exhausted → terminate as `Completed` (best-effort code is
///    still a success, not a failure).
/// 3. Code present but never executed → execute.
/// 4. Last execution failed → regenerate.
/// 5. Execution passed but no review yet → review.
/// 6. Review found issues, or the review itself failed → regenerate.
/// 7. Everything passed → terminate as `Completed`.
pub fn decide(mut state: DevelopmentState) -> DevelopmentState {
    info!(
        iteration = state.iteration_count,
        limit = state.iteration_limit,
        "Orchestrator deciding next step"
    );

    // Rule 1: bootstrap.
    if state.iteration_count == 0 {
        state.status = SessionStatus::InProgress;
        state.iteration_count = 1;
        state.pending_agent = PendingAgent::Code;
        info!("Routing to coder for initial implementation");
        return state;
    }

    // Rule 2: budget exhaustion. The sole total-progress guard.
    if state.iteration_count >= state.iteration_limit {
        state.status = SessionStatus::Completed;
        state.pending_agent = PendingAgent::Done;
        info!("Iteration budget exhausted, ending with best-effort code");
        return state;
    }

    // Rule 3: untested code.
    if !state.code.is_empty() && state.execution.is_none() {
        state.pending_agent = PendingAgent::Execute;
        info!("Code exists but is untested, routing to sandbox");
        return state;
    }

    // Rule 4: execution failure routes back to generation.
    if state.execution.as_ref().is_some_and(|r| !r.passed()) {
        state.pending_agent = PendingAgent::Code;
        info!("Execution failed, routing back to coder");
        return state;
    }

    // Rule 5: passing execution, not yet reviewed.
    if state.execution_passed() && state.review.is_none() {
        state.pending_agent = PendingAgent::Review;
        info!("Execution passed, routing to reviewer");
        return state;
    }

    // Rule 6: issues found, or the review could not be completed. An
    // unknown outcome routes like a failure rather than as approval.
    if state
        .review
        .as_ref()
        .is_some_and(|r| !matches!(r, ReviewOutcome::Approved { .. }))
    {
        state.pending_agent = PendingAgent::Code;
        info!("Review requires changes, routing back to coder");
        return state;
    }

    // Rule 7: all checks passed.
    state.status = SessionStatus::Completed;
    state.pending_agent = PendingAgent::Done;
    info!("All checks passed, task completed");
    state
}
