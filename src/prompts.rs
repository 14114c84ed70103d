//! Prompt templates for the coder and reviewer roles.
//!
//! Templates use a `{context}` / `{code}` placeholder filled with
//! `str::replace`. The reviewer's markers (`APPROVED:` / `ISSUES FOUND:`)
//! are part of the contract with [`crate::agents::ReviewOutcome`].

/// Prompt for the first code draft.
pub const CODER_INITIAL_PROMPT: &str = r#"You are a Python coding expert. Create clean, working Python code for this request:

{context}

Requirements:
- Write complete, executable Python code
- Include proper error handling
- Add docstrings and comments
- Follow PEP 8 standards
- Make it production-ready

Return ONLY the Python code, no explanations."#;

/// Prompt for fixing an existing draft against execution and review feedback.
pub const CODER_FIX_PROMPT: &str = r#"You are a Python coding expert. Fix the existing code based on the feedback:

{context}

Requirements:
- Fix any execution errors
- Address review feedback if provided
- Maintain existing functionality
- Follow PEP 8 standards
- Return ONLY the corrected Python code, no explanations."#;

/// Prompt for the review pass.
pub const REVIEW_PROMPT: &str = r#"You are a Python code reviewer focused on correctness, brevity and PEP 8 compliance.

Review this code:

```python
{code}
```

Provide feedback on:
1. PEP 8 compliance issues
2. Code brevity improvements
3. Readability enhancements
4. Best practices

If the code is good, respond with "APPROVED: Code meets standards."
If issues exist, provide specific, actionable feedback starting with "ISSUES FOUND:" followed by numbered points.

Be concise but thorough."#;

/// Marker the reviewer uses to signal approval.
pub const APPROVED_MARKER: &str = "approved";

/// Marker the reviewer uses to signal problems.
pub const ISSUES_MARKER: &str = "issues";

/// Sample development requests, usable from the CLI for smoke runs.
pub fn sample_requests() -> Vec<&'static str> {
    vec![
        "Write a Python script that takes a single string as a command-line argument and \
         prints 'True' if it is a palindrome (ignoring case and non-alphanumeric characters), \
         'False' otherwise.",
        "Create a Python script implementing a Caesar cipher. Arguments: mode \
         ('encrypt'/'decrypt'), text, and an integer shift key. Only alphabetic characters \
         shift, preserving case, wrapping around the alphabet.",
        "Write a Python script that reads a text file given as a command-line argument and \
         prints the 10 most frequent words with their counts, case-insensitive, punctuation \
         stripped, formatted as 'word: count'.",
        "Create a Python function that calculates the value of pi to 10 decimal places using \
         the Monte Carlo method.",
    ]
}
