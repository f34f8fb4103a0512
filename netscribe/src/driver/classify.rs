//! Output classification: deciding whether a command's output is a result
//! or an error.
//!
//! Classification is a substring heuristic, not a protocol-level error
//! channel. Output that legitimately mentions a failure word is reported as an
//! error. The dispatcher only sees the [`OutputClassifier`] trait, so a stricter
//! parser can replace these.

use crate::transcript::Entry;
use crate::transport::ExecOutput;

/// Raw text produced by one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, or the whole terminal stream for interactive shells.
    pub stdout: String,

    /// Standard error. Always empty for interactive shells.
    pub stderr: String,
}

impl CommandOutput {
    /// Output captured from an interactive shell.
    pub fn from_terminal(data: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(data).into_owned(),
            stderr: String::new(),
        }
    }

    /// Output captured from an exec channel.
    pub fn from_exec(output: &ExecOutput) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Turns raw command output into a transcript entry.
///
/// Implementations must be pure: the same input always gives the same entry.
pub trait OutputClassifier: Send + Sync {
    /// Classify one command's output.
    fn classify(&self, output: &CommandOutput) -> Entry;
}

/// Substring policy for terminal output.
///
/// The trimmed output is an error if it contains any case-insensitive
/// pattern or any case-sensitive pattern. The error entry carries the
/// trimmed output unless a fixed message is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePatterns {
    /// Lowercased patterns matched regardless of case.
    ignore_case: Vec<String>,

    /// Patterns matched exactly.
    exact: Vec<String>,

    /// Replaces the device text in error entries.
    error_message: Option<String>,
}

impl FailurePatterns {
    /// An empty policy: everything is output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a case-sensitive pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exact.push(pattern.into());
        self
    }

    /// Add a pattern matched regardless of case.
    pub fn with_pattern_ignore_case(mut self, pattern: impl AsRef<str>) -> Self {
        self.ignore_case.push(pattern.as_ref().to_lowercase());
        self
    }

    /// Report every failure as `message` instead of the device output.
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// The first pattern found in `text`, if any.
    pub fn matched(&self, text: &str) -> Option<&str> {
        if !self.ignore_case.is_empty() {
            let lowered = text.to_lowercase();
            if let Some(p) = self.ignore_case.iter().find(|p| lowered.contains(p.as_str())) {
                return Some(p);
            }
        }
        self.exact
            .iter()
            .find(|p| text.contains(p.as_str()))
            .map(String::as_str)
    }
}

impl OutputClassifier for FailurePatterns {
    fn classify(&self, output: &CommandOutput) -> Entry {
        let text = output.stdout.trim();
        match (self.matched(text), &self.error_message) {
            (Some(_), Some(message)) => Entry::error(message.as_str()),
            (Some(_), None) => Entry::error(text),
            (None, _) => Entry::output(text),
        }
    }
}

/// Exec-channel policy: anything on stderr makes the command an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StderrClassifier;

impl OutputClassifier for StderrClassifier {
    fn classify(&self, output: &CommandOutput) -> Entry {
        let stderr = output.stderr.trim();
        if stderr.is_empty() {
            Entry::output(output.stdout.trim())
        } else {
            Entry::error(stderr)
        }
    }
}
