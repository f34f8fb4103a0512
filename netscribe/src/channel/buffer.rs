//! Pattern buffer with ANSI stripping and tail search.
//!
//! Output from the device is accumulated here between reads. Prompt
//! detection either scans the whole buffer (login prompts, where the first
//! occurrence wins) or only its last `search_depth` bytes (trailing prompts
//! after a command, where the output in front of the prompt may be large).

use std::fmt;

use bytes::BytesMut;

use super::patterns::PromptMatcher;

/// Buffer for accumulating output and searching it for prompts.
pub struct PatternBuffer {
    /// The accumulated, escape-free output.
    buffer: BytesMut,

    /// How many bytes from the end `search_tail` looks at.
    search_depth: usize,

    /// Terminal parser; keeps state so escape sequences split across
    /// reads are still removed.
    parser: vte::Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: vte::Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PlainText::default();
        self.parser.advance(&mut sink, data);
        self.buffer.extend_from_slice(&sink.out);
    }

    /// Find the first match anywhere in the buffer.
    ///
    /// Returns the absolute offset just past the match.
    pub fn find(&self, matcher: &dyn PromptMatcher) -> Option<usize> {
        matcher.find_match(&self.buffer)
    }

    /// Search only the last `search_depth` bytes.
    ///
    /// Returns the absolute offset just past the match.
    pub fn search_tail(&self, matcher: &dyn PromptMatcher) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        matcher
            .find_match(&self.buffer[start..])
            .map(|end| start + end)
    }

    /// Remove and return everything up to `end`.
    pub fn take_to(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).to_vec()
    }

    /// Remove and return at most `max` bytes from the front.
    pub fn take_at_most(&mut self, max: usize) -> Vec<u8> {
        self.take_to(max)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Collects printable text and line control, drops everything else.
#[derive(Default)]
struct PlainText {
    out: Vec<u8>,
}

impl vte::Perform for PlainText {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out
            .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns::Literal;
    use regex::bytes::Regex;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!\r\n");
        assert_eq!(buffer.as_slice(), b"Hello, world!\r\n");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_escape_split_across_reads() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"router\x1b[");
        buffer.extend(b"1mlab\x1b[0m#");
        assert_eq!(buffer.as_slice(), b"routerlab#");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrouter#");

        let pattern = Regex::new(r"router#").unwrap();
        assert_eq!(buffer.search_tail(&pattern), Some(108));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
        assert_eq!(buffer.find(&pattern), Some(7));
    }

    #[test]
    fn test_take_to_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Username: extra");

        let end = buffer.find(&Literal::new("Username:")).unwrap();
        assert_eq!(buffer.take_to(end), b"Username:");
        assert_eq!(buffer.as_slice(), b" extra");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
