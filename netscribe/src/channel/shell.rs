//! Interactive shell channel: prompt reads, settling, and draining on top of
//! any bidirectional byte stream.

use std::future::Future;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::{Instant, timeout, timeout_at};

use super::buffer::PatternBuffer;
use super::patterns::PromptMatcher;
use super::settle::{ReadPolicy, Settle};
use crate::error::{ChannelError, Result};

/// A raw byte stream to a remote interactive CLI.
///
/// Implemented by SSH PTY shells and Telnet connections. Implementations
/// must make `read_chunk` cancel-safe: dropping the future before it
/// completes must not lose data.
pub trait Shell: Send {
    /// Write all bytes to the remote side.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output. `Ok(None)` means end-of-file.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Close the stream.
    fn shutdown(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Configuration for shell channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Upper bound for prompt waits and bounded reads.
    pub timeout: Duration,

    /// Search depth for trailing-prompt matching.
    pub search_depth: usize,

    /// How long a drain waits for the next chunk before returning.
    pub drain_poll: Duration,

    /// Total time a single drain may spend reading, so a device that never
    /// stops talking cannot hold it open.
    pub drain_limit: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            search_depth: 1000,
            drain_poll: Duration::from_millis(50),
            drain_limit: Duration::from_millis(500),
        }
    }
}

/// High-level channel for an interactive device session.
///
/// Wraps a [`Shell`] and a [`PatternBuffer`]; output read while waiting for
/// one thing stays buffered for the next read.
pub struct ShellChannel<S> {
    shell: S,
    buffer: PatternBuffer,
    config: ChannelConfig,
    eof: bool,
}

impl<S: Shell> ShellChannel<S> {
    /// Create a new channel over an open shell.
    pub fn new(shell: S, config: ChannelConfig) -> Self {
        Self {
            shell,
            buffer: PatternBuffer::new(config.search_depth),
            config,
            eof: false,
        }
    }

    /// Send a line of input, terminated by `\n`.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.shell.write_all(&data).await
    }

    /// Read until `matcher` matches, returning everything up to and
    /// including the match. Bytes after the match stay buffered.
    pub async fn read_until(
        &mut self,
        matcher: &dyn PromptMatcher,
        wait: Duration,
    ) -> Result<Vec<u8>> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(end) = self.buffer.find(matcher) {
                trace!("matched {:?} after {} bytes", matcher.describe(), end);
                return Ok(self.buffer.take_to(end));
            }
            if self.eof {
                return Err(ChannelError::Closed.into());
            }
            match timeout_at(deadline, self.shell.read_chunk()).await {
                Ok(Ok(Some(chunk))) => self.buffer.extend(&chunk),
                Ok(Ok(None)) => self.eof = true,
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ChannelError::PatternTimeout(wait).into()),
            }
        }
    }

    /// Wait for output to stabilize according to `settle`.
    ///
    /// Never fails on timeout: a strategy that runs out of time just stops
    /// waiting.
    pub async fn settle(&mut self, settle: &Settle) -> Result<()> {
        match settle {
            Settle::FixedDelay(delay) => {
                tokio::time::sleep(*delay).await;
            }
            Settle::Idle { quiet, max } => {
                let hard_deadline = Instant::now() + *max;
                while !self.eof {
                    let until = (Instant::now() + *quiet).min(hard_deadline);
                    match timeout_at(until, self.shell.read_chunk()).await {
                        Ok(Ok(Some(chunk))) => self.buffer.extend(&chunk),
                        Ok(Ok(None)) => self.eof = true,
                        Ok(Err(e)) => return Err(e),
                        Err(_) => break,
                    }
                    if Instant::now() >= hard_deadline {
                        break;
                    }
                }
            }
            Settle::Prompt { pattern, timeout } => {
                let deadline = Instant::now() + *timeout;
                while !self.eof && self.buffer.search_tail(pattern).is_none() {
                    match timeout_at(deadline, self.shell.read_chunk()).await {
                        Ok(Ok(Some(chunk))) => self.buffer.extend(&chunk),
                        Ok(Ok(None)) => self.eof = true,
                        Ok(Err(e)) => return Err(e),
                        Err(_) => {
                            warn!(
                                "prompt {:?} not seen within {:?}, taking output as is",
                                pattern.as_str(),
                                timeout
                            );
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Take output according to `policy`.
    pub async fn read_available(&mut self, policy: ReadPolicy) -> Result<Vec<u8>> {
        match policy {
            ReadPolicy::Drain => self.drain().await,
            ReadPolicy::Bounded(max) => {
                if self.buffer.is_empty() && !self.eof {
                    match timeout(self.config.timeout, self.shell.read_chunk()).await {
                        Ok(Ok(Some(chunk))) => self.buffer.extend(&chunk),
                        Ok(Ok(None)) => self.eof = true,
                        Ok(Err(e)) => return Err(e),
                        Err(_) => {
                            debug!("no output within {:?}", self.config.timeout);
                            return Ok(Vec::new());
                        }
                    }
                }
                let deadline = Instant::now() + self.config.drain_limit;
                while self.buffer.len() < max && self.poll_once(deadline).await? {}
                if self.buffer.is_empty() && self.eof {
                    return Err(ChannelError::Closed.into());
                }
                Ok(self.buffer.take_at_most(max))
            }
        }
    }

    /// Take everything currently available. Stops at the first gap longer
    /// than the drain poll interval, or once the drain limit is spent.
    ///
    /// Fails with [`ChannelError::Closed`] only when the stream has ended and
    /// nothing is left to return.
    pub async fn drain(&mut self) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.config.drain_limit;
        while self.poll_once(deadline).await? {}
        if Instant::now() >= deadline {
            debug!("drain cut off after {:?}", self.config.drain_limit);
        }
        if self.buffer.is_empty() && self.eof {
            return Err(ChannelError::Closed.into());
        }
        Ok(self.buffer.take())
    }

    /// Read one chunk if it shows up within the drain poll interval and
    /// before `deadline`. Returns whether anything was read.
    async fn poll_once(&mut self, deadline: Instant) -> Result<bool> {
        let now = Instant::now();
        if self.eof || now >= deadline {
            return Ok(false);
        }
        let until = (now + self.config.drain_poll).min(deadline);
        match timeout_at(until, self.shell.read_chunk()).await {
            Ok(Ok(Some(chunk))) => {
                self.buffer.extend(&chunk);
                Ok(true)
            }
            Ok(Ok(None)) => {
                self.eof = true;
                Ok(false)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(false),
        }
    }

    /// Whether the remote side has closed the stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Get a reference to the buffer.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Clear the internal buffer.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Close the underlying shell, consuming the channel.
    pub async fn close(mut self) -> Result<()> {
        self.shell.shutdown().await
    }
}
