//! Transcript of a session: the ordered record of commands and their results.

use serde::{Deserialize, Serialize};

/// Kind of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Echo of a command that was sent.
    Command,
    /// Output judged to be a normal result.
    Output,
    /// A classified command error or a fatal session error.
    Error,
}

/// One record in a transcript.
///
/// Serializes as `{"type": "command" | "output" | "error", "content": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    kind: EntryKind,
    content: String,
}

impl Entry {
    /// Create a new entry.
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// A `command` entry.
    pub fn command(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Command, content)
    }

    /// An `output` entry.
    pub fn output(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Output, content)
    }

    /// An `error` entry.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Error, content)
    }

    /// The entry kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The entry text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check if this entry is an error.
    pub fn is_error(&self) -> bool {
        self.kind == EntryKind::Error
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Every command ran (some may have been classified as errors).
    #[default]
    Completed,
    /// The transport dropped mid-loop; the transcript is partial.
    Aborted,
    /// Connection or login failed before any command ran.
    Failed,
}

/// Ordered record of one session.
///
/// Entries can only be appended. Once the outcome leaves
/// [`Outcome::Completed`] the transcript is sealed and further appends are
/// ignored, so nothing can follow a fatal error entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
    outcome: Outcome,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript holding only a fatal pre-command error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            entries: vec![Entry::error(message)],
            outcome: Outcome::Failed,
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: Entry) {
        if self.outcome != Outcome::Completed {
            return;
        }
        self.entries.push(entry);
    }

    /// Append a final error entry and mark the transcript as aborted.
    pub fn abort(&mut self, message: impl Into<String>) {
        if self.outcome != Outcome::Completed {
            return;
        }
        self.push(Entry::error(message));
        self.outcome = Outcome::Aborted;
    }

    /// The entries in order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Consume the transcript, returning its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// How the session ended.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the transcript has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}
