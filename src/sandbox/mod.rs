//! Isolated execution of untrusted generated code.
//!
//! One fresh container per run, one read-write bind mount, unconditional
//! teardown. Infrastructure failures are kept distinct from the program
//! under test exiting non-zero.

pub mod docker;
pub mod executor;

pub use docker::{DockerClient, RunSpec};
pub use executor::{DockerSandboxExecutor, ExecutionRecord, Executor};
