//! Agents wrapping the completion port.
//!
//! The code agent generates and fixes code; the review agent classifies
//! reviewer feedback into a tagged outcome. Both mutate the development
//! state in place and confine provider failures to the state's error log.

pub mod coder;
pub mod reviewer;

pub use coder::CodeAgent;
pub use reviewer::{ReviewAgent, ReviewOutcome};
