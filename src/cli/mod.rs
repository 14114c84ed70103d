//! Command-line interface for devloop.
//!
//! Provides commands for running development sessions and inspecting the
//! built-in sample requests.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, RunArgs};
