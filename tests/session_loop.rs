//! Integration tests for the full development loop.
//!
//! The session is driven end to end against an in-memory completion port
//! and an in-memory executor, so every routing path through the loop is
//! exercised without a provider or a Docker daemon.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use devloop::agents::ReviewOutcome;
use devloop::error::{LlmError, SandboxError};
use devloop::llm::{CompletionPort, Role};
use devloop::sandbox::{ExecutionRecord, Executor};
use devloop::session::{DevelopmentSession, OutputOptions, SessionStatus};

/// Completion port replaying per-role scripts. Each call pops the next
/// response for its role; an exhausted script repeats its last entry.
struct ScriptedPort {
    coder: Mutex<VecDeque<Result<String, String>>>,
    reviewer: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedPort {
    fn new(
        coder: Vec<Result<&str, &str>>,
        reviewer: Vec<Result<&str, &str>>,
    ) -> Self {
        let own = |script: Vec<Result<&str, &str>>| {
            script
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect()
        };
        Self {
            coder: Mutex::new(own(coder)),
            reviewer: Mutex::new(own(reviewer)),
        }
    }
}

#[async_trait]
impl CompletionPort for ScriptedPort {
    async fn complete(&self, role: Role, _prompt: &str) -> Result<String, LlmError> {
        let script = match role {
            Role::Coder => &self.coder,
            Role::Reviewer => &self.reviewer,
            Role::Planner => &self.coder,
        };
        let mut script = script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Err("script empty".to_string()))
        };
        next.map_err(LlmError::RequestFailed)
    }
}

/// Executor replaying a script of exit statuses (the last repeats), or an
/// infrastructure error where the script holds `Err`.
struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<(i64, String), String>>>,
    runs: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    fn new(script: Vec<Result<(i64, &str), &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| {
                        r.map(|(code, out)| (code, out.to_string()))
                            .map_err(str::to_string)
                    })
                    .collect(),
            ),
            runs: Mutex::new(Vec::new()),
        }
    }

    fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn run(&self, code: &str) -> Result<ExecutionRecord, SandboxError> {
        self.runs.lock().unwrap().push(code.to_string());
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Ok((0, String::new())))
        };
        match next {
            Ok((status, output)) => Ok(ExecutionRecord::completed(status, output)),
            Err(e) => Err(SandboxError::RunFailed(e)),
        }
    }
}

fn fenced(code: &str) -> String {
    format!("Here you go:\n```python\n{code}\n```")
}

#[tokio::test]
async fn test_clean_pass_completes_in_one_cycle() {
    let port = Arc::new(ScriptedPort::new(
        vec![Ok(&fenced("print(\"hello\")"))],
        vec![Ok("APPROVED: Code meets standards.")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "hello\n"))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print hello", 5).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.code, "print(\"hello\")");
    assert_eq!(state.iteration_count, 2);
    assert_eq!(executor.run_count(), 1);
    assert!(state.review.as_ref().unwrap().is_approved());
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn test_failed_execution_triggers_fix_cycle() {
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("prnt(\"oops\")")),
            Ok(&fenced("print(\"fixed\")")),
        ],
        vec![Ok("APPROVED: fine")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![
        Ok((1, "NameError: name 'prnt' is not defined")),
        Ok((0, "fixed\n")),
    ]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print fixed", 10).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.code, "print(\"fixed\")");
    assert_eq!(state.iteration_count, 3);
    assert_eq!(executor.run_count(), 2);
    assert!(state.execution.as_ref().unwrap().passed());
}

#[tokio::test]
async fn test_review_rejection_triggers_fix_cycle() {
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("print(1+1)")),
            Ok(&fenced("print(2)")),
        ],
        vec![
            Ok("ISSUES FOUND:\n1. Compute the value directly."),
            Ok("APPROVED: clear now"),
        ],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "2\n"))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print two", 10).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.code, "print(2)");
    // Both artifacts were executed: the rejection cleared the old record.
    assert_eq!(executor.run_count(), 2);
    assert!(state.review.as_ref().unwrap().is_approved());
}

#[tokio::test]
async fn test_review_failure_routes_back_to_coder_not_approval() {
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("print(1)")),
            Ok(&fenced("print(1)  # retry")),
        ],
        vec![
            Err("provider timeout"),
            Ok("APPROVED: fine"),
        ],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "1\n"))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print one", 10).await;

    // The failed review produced a second generation cycle rather than a
    // silent approval.
    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.iteration_count, 3);
    assert_eq!(executor.run_count(), 2);
    assert!(state.review.as_ref().unwrap().is_approved());
    assert!(state.errors.iter().any(|e| e.contains("provider timeout")));
}

#[tokio::test]
async fn test_markerless_review_routes_like_failure() {
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("print(1)")),
            Ok(&fenced("print(1)")),
        ],
        vec![
            Ok("Looks pretty reasonable to me overall."),
            Ok("APPROVED: fine"),
        ],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "1\n"))]));

    let session = DevelopmentSession::new(port, executor);
    let state = session.develop("print one", 10).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert!(state.review.as_ref().unwrap().is_approved());
    assert!(state
        .errors
        .iter()
        .any(|e| e.contains("verdict")));
}

#[tokio::test]
async fn test_budget_exhaustion_returns_best_effort_code() {
    // The reviewer never approves; the budget ends the loop as Completed.
    let port = Arc::new(ScriptedPort::new(
        vec![Ok(&fenced("print(1)"))],
        vec![Ok("ISSUES FOUND:\n1. Never satisfied.")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "1\n"))]));

    let session = DevelopmentSession::new(port, executor);
    let state = session.develop("print one", 4).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.iteration_count, 4);
    assert!(!state.code.is_empty());
}

#[tokio::test]
async fn test_budget_of_one_stops_after_first_generation() {
    let port = Arc::new(ScriptedPort::new(
        vec![Ok(&fenced("print(1)"))],
        vec![Ok("APPROVED")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "1\n"))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print one", 1).await;

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.code, "print(1)");
    // The budget ended the loop before the sandbox or reviewer ran.
    assert_eq!(executor.run_count(), 0);
    assert!(state.review.is_none());
}

#[tokio::test]
async fn test_zero_iteration_limit_fails() {
    let port = Arc::new(ScriptedPort::new(vec![Ok("x")], vec![Ok("APPROVED")]));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, ""))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("anything", 0).await;

    assert_eq!(state.status, SessionStatus::Failed);
    assert_eq!(executor.run_count(), 0);
    assert!(state.errors.iter().any(|e| e.contains("at least 1")));
}

#[tokio::test]
async fn test_sandbox_infrastructure_failure_is_survivable() {
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("print(1)")),
            Ok(&fenced("print(2)")),
        ],
        vec![Ok("APPROVED: fine")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![
        Err("docker daemon unreachable"),
        Ok((0, "2\n")),
    ]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print two", 10).await;

    // The infrastructure failure was recorded and routed like a failed
    // run, then the retry went through.
    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(executor.run_count(), 2);
    assert!(state
        .errors
        .iter()
        .any(|e| e.contains("docker daemon unreachable")));
}

#[tokio::test]
async fn test_coder_stall_fails_instead_of_spinning() {
    // One good artifact that never passes execution, then a dead provider:
    // the loop must stop instead of re-dispatching the coder forever.
    let port = Arc::new(ScriptedPort::new(
        vec![
            Ok(&fenced("prnt(1)")),
            Err("service down"),
        ],
        vec![Ok("APPROVED")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((1, "NameError"))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print one", 100).await;

    assert_eq!(state.status, SessionStatus::Failed);
    assert!(state.errors.iter().any(|e| e.contains("stalled")));
    // The stale artifact survives for inspection.
    assert_eq!(state.code, "prnt(1)");
}

#[tokio::test]
async fn test_initial_coder_failure_ends_without_code() {
    let port = Arc::new(ScriptedPort::new(
        vec![Err("service down")],
        vec![Ok("APPROVED")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, ""))]));

    let session = DevelopmentSession::new(port, executor.clone());
    let state = session.develop("print one", 5).await;

    // No artifact was ever produced, so there is nothing to execute or
    // review and the loop ends.
    assert!(state.code.is_empty());
    assert_eq!(executor.run_count(), 0);
    assert!(state.errors.iter().any(|e| e.contains("service down")));
    assert!(state.status.is_terminal());
}

#[tokio::test]
async fn test_completed_session_persists_output() {
    let dir = tempfile::tempdir().unwrap();
    let port = Arc::new(ScriptedPort::new(
        vec![Ok(&fenced("print(\"hello\")"))],
        vec![Ok("APPROVED: fine")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "hello\n"))]));

    let session = DevelopmentSession::new(port, executor)
        .with_output(OutputOptions::new(dir.path()).with_metadata());
    let state = session.develop("print hello", 5).await;

    assert_eq!(state.status, SessionStatus::Completed);
    let code = std::fs::read_to_string(dir.path().join("output.py")).unwrap();
    assert_eq!(code, "print(\"hello\")");

    let metadata =
        std::fs::read_to_string(dir.path().join("output_metadata.json")).unwrap();
    assert!(metadata.contains("\"status\": \"completed\""));
    assert!(metadata.contains("print hello"));
}

#[tokio::test]
async fn test_custom_prompts_flow_through() {
    struct EchoPromptPort(Mutex<Vec<(Role, String)>>);

    #[async_trait]
    impl CompletionPort for EchoPromptPort {
        async fn complete(&self, role: Role, prompt: &str) -> Result<String, LlmError> {
            self.0.lock().unwrap().push((role, prompt.to_string()));
            Ok(match role {
                Role::Reviewer => "APPROVED".to_string(),
                _ => "print(1)".to_string(),
            })
        }
    }

    let port = Arc::new(EchoPromptPort(Mutex::new(Vec::new())));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "1\n"))]));

    let session = DevelopmentSession::new(port.clone(), executor)
        .with_initial_prompt("CUSTOM-INIT {context}")
        .with_review_prompt("CUSTOM-REVIEW {code}");
    let state = session.develop("print one", 5).await;

    assert_eq!(state.status, SessionStatus::Completed);
    let calls = port.0.lock().unwrap();
    assert!(calls
        .iter()
        .any(|(r, p)| *r == Role::Coder && p.starts_with("CUSTOM-INIT ")));
    assert!(calls
        .iter()
        .any(|(r, p)| *r == Role::Reviewer && p == "CUSTOM-REVIEW print(1)"));
}

#[tokio::test]
async fn test_rejected_review_feedback_reaches_next_review() {
    // The rejected outcome must be cleared when new code lands, so the
    // second review sees only the new artifact.
    let port = Arc::new(ScriptedPort::new(
        vec![Ok(&fenced("print(1)")), Ok(&fenced("print(2)"))],
        vec![Ok("ISSUES FOUND:\n1. wrong value"), Ok("APPROVED")],
    ));
    let executor = Arc::new(ScriptedExecutor::new(vec![Ok((0, "ok"))]));

    let session = DevelopmentSession::new(port, executor);
    let state = session.develop("print two", 10).await;

    assert_eq!(state.status, SessionStatus::Completed);
    match state.review.as_ref().unwrap() {
        ReviewOutcome::Approved { feedback } => assert_eq!(feedback, "APPROVED"),
        other => panic!("expected approval, got {other:?}"),
    }
}
