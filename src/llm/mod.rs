//! LLM integration for devloop.
//!
//! One OpenAI-compatible HTTP client ([`ChatClient`]) and a role router
//! that binds the planner/coder/reviewer roles to concrete models. The
//! rest of the crate only sees the [`CompletionPort`] trait.

pub mod client;
pub mod roles;

pub use client::{
    ChatClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
pub use roles::{CompletionPort, Role, RoleBinding, RoleRouter};
