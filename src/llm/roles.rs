//! Role-based completion routing.
//!
//! The loop never talks to a provider directly. It asks the completion
//! port for text in a given [`Role`], and the [`RoleRouter`] resolves the
//! role to a model and temperature on one shared provider. This keeps the
//! orchestration core agnostic to which model backs which role.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LoopConfig;
use crate::error::LlmError;
use crate::llm::client::{GenerationRequest, LlmProvider, Message};

/// The role a completion is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Plans and routes; bound to a fast model.
    Planner,
    /// Produces and fixes code.
    Coder,
    /// Reviews code for correctness and style.
    Reviewer,
}

impl Role {
    /// Stable lowercase name, used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Planner => "planner",
            Role::Coder => "coder",
            Role::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract text-completion capability bound to roles.
///
/// The orchestration core depends only on this trait; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// Produce a completion for `prompt` using the model bound to `role`.
    async fn complete(&self, role: Role, prompt: &str) -> Result<String, LlmError>;
}

/// Model and sampling parameters bound to one role.
#[derive(Debug, Clone)]
pub struct RoleBinding {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature. Coders get a little headroom, reviewers none.
    pub temperature: f64,
}

/// Routes role-tagged completion requests to a single provider with
/// per-role model bindings.
pub struct RoleRouter {
    provider: Arc<dyn LlmProvider>,
    planner: RoleBinding,
    coder: RoleBinding,
    reviewer: RoleBinding,
}

impl RoleRouter {
    /// Creates a router with explicit bindings.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        planner: RoleBinding,
        coder: RoleBinding,
        reviewer: RoleBinding,
    ) -> Self {
        Self {
            provider,
            planner,
            coder,
            reviewer,
        }
    }

    /// Creates a router from a loop configuration.
    ///
    /// Temperatures follow the source system: 0.1 for the coder so fixes
    /// stay close to the prior draft, 0.0 for planner and reviewer.
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &LoopConfig) -> Self {
        Self::new(
            provider,
            RoleBinding {
                model: config.planner_model.clone(),
                temperature: 0.0,
            },
            RoleBinding {
                model: config.coder_model.clone(),
                temperature: 0.1,
            },
            RoleBinding {
                model: config.reviewer_model.clone(),
                temperature: 0.0,
            },
        )
    }

    /// Returns the binding for a role.
    pub fn binding(&self, role: Role) -> &RoleBinding {
        match role {
            Role::Planner => &self.planner,
            Role::Coder => &self.coder,
            Role::Reviewer => &self.reviewer,
        }
    }
}

#[async_trait]
impl CompletionPort for RoleRouter {
    async fn complete(&self, role: Role, prompt: &str) -> Result<String, LlmError> {
        let binding = self.binding(role);
        if binding.model.is_empty() {
            return Err(LlmError::MissingModel(role.as_str().to_string()));
        }

        tracing::debug!(role = %role, model = %binding.model, "Dispatching completion");

        let request = GenerationRequest::new(binding.model.clone(), vec![Message::user(prompt)])
            .with_temperature(binding.temperature);

        let response = self.provider.generate(request).await?;

        response
            .first_content()
            .map(|s| s.to_string())
            .ok_or(LlmError::EmptyCompletion)
    }
}
