//! UTF-8-safe string helpers
//!
//! Page text arrives in every script and encoding the web has, so slicing by
//! byte offsets is never safe here.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid"));

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("BUG: hardcoded blank-line regex is invalid"));

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// # Examples
/// ```
/// # use kodegen_tools_research::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("🎉🎊🎈", 2), "🎉🎊");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse every whitespace run (including newlines) into a single space
///
/// Used for search snippets, which the engine renders across several inline
/// elements.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Squeeze runs of three or more newlines down to one blank line
pub fn squeeze_blank_lines(s: &str) -> String {
    BLANK_LINE_RUN.replace_all(s.trim(), "\n\n").into_owned()
}
