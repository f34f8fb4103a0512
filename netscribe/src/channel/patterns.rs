//! Pattern matching utilities for prompt detection.

use std::borrow::Cow;

use memchr::memmem;
use regex::bytes::Regex;

/// Trait for prompt matching - literal or regex, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where the first match ends, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<usize>;

    /// Human-readable form of the pattern, for logs and error messages.
    fn describe(&self) -> Cow<'_, str>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// Regex-based prompt matcher.
impl PromptMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        self.find(data).map(|m| m.end())
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// Exact byte-sequence matcher, the way login prompts like `Username:` are
/// awaited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    needle: Vec<u8>,
}

impl Literal {
    /// Create a matcher for the given text.
    pub fn new(needle: impl AsRef<[u8]>) -> Self {
        Self {
            needle: needle.as_ref().to_vec(),
        }
    }

    /// The bytes being searched for.
    pub fn needle(&self) -> &[u8] {
        &self.needle
    }
}

impl PromptMatcher for Literal {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        memmem::find(data, &self.needle).map(|start| start + self.needle.len())
    }

    fn describe(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.needle)
    }
}

/// Compile a prompt pattern string into a regex.
///
/// Anchors to end of input (allowing trailing ASCII whitespace) unless the
/// pattern already carries an anchor.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}(?-u:\\s)*$", pattern)
    };

    Regex::new(&pattern)
}

/// The last non-empty line of some output, trimmed. On an interactive CLI
/// this is the prompt.
pub fn last_line(data: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(data);
    match text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
    {
        Some(line) => Cow::Owned(line.to_string()),
        None => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_prompt_matcher() {
        let pattern = Regex::new(r"router#(?-u:\s)*$").unwrap();
        assert!(pattern.is_match(b"router# "));
        assert!(pattern.is_match(b"some output\nrouter#"));
        assert!(!PromptMatcher::is_match(&pattern, b"router> "));
    }

    #[test]
    fn test_literal_matcher() {
        let literal = Literal::new("Username:");
        assert_eq!(literal.find_match(b"\r\nUser Access\r\n\r\nUsername: "), Some(26));
        assert_eq!(literal.find_match(b"username:"), None);
        assert_eq!(literal.describe(), "Username:");
    }

    #[test]
    fn test_literal_first_occurrence() {
        let literal = Literal::new("#");
        assert_eq!(literal.find_match(b"# banner\r\nrouter#"), Some(1));
    }

    #[test]
    fn test_compile_prompt_pattern() {
        let pattern = compile_prompt_pattern(r">").unwrap();
        assert!(pattern.is_match(b"switch> "));
        assert!(!pattern.is_match(b"> not a prompt"));

        let pattern = compile_prompt_pattern(r"router#$").unwrap();
        assert!(pattern.is_match(b"router#"));

        let pattern = compile_prompt_pattern("#").unwrap();
        assert_eq!(pattern.as_str(), r"#(?-u:\s)*$");
        assert!(pattern.is_match(b"show clock\r\n*10:02:11 UTC\r\nrouter#\r\n "));
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line(b"Welcome\r\n\r\nswitch>  \r\n"), "switch>");
        assert_eq!(last_line(b"\r\n\r\n"), "");
    }
}
