//! Code extraction from LLM completions.
//!
//! Completions routinely wrap code in markdown fences with narrative text
//! around them. Extraction is deterministic: the first fenced block wins;
//! a completion with no fences is used verbatim after trimming.

use regex::Regex;

/// Extracts the code payload from a raw completion.
///
/// Strategy order:
/// 1. First ```lang-tagged or untagged fenced block — only its contents.
/// 2. No fence at all — the whole completion, trimmed.
///
/// Extraction is idempotent: bare code passes through unchanged.
pub fn extract_code_block(content: &str) -> String {
    if let Some(block) = first_fenced_block(content) {
        return block;
    }

    content.trim().to_string()
}

/// Returns the contents of the first fenced code block, if any.
///
/// The language tag (` ```python `) is dropped. An unterminated fence is
/// treated as no fence so the caller falls back to the raw text.
fn first_fenced_block(content: &str) -> Option<String> {
    let re = Regex::new(r"```(?:[A-Za-z0-9_+-]*)\r?\n?([\s\S]*?)```").expect("static regex");
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
