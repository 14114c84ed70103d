//! Shared utilities.

pub mod code_extraction;

pub use code_extraction::extract_code_block;
