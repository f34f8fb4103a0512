//! Channel layer for prompt matching and interactive reads.
//!
//! This module handles the byte-stream side of a session: buffering,
//! ANSI stripping, prompt detection, and output stabilization.

mod buffer;
mod patterns;
mod settle;
mod shell;

pub use buffer::PatternBuffer;
pub use patterns::{Literal, PromptMatcher, compile_prompt_pattern, last_line};
pub use settle::{ReadPolicy, Settle};
pub use shell::{ChannelConfig, Shell, ShellChannel};

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted in-memory [`Shell`] for driving session logic in tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::Shell;
    use crate::error::{ChannelError, Result};

    /// What the remote side does after receiving an expected line.
    pub(crate) enum Reply {
        Chunks(Vec<Vec<u8>>),
        ChunksThenHangUp(Vec<Vec<u8>>),
    }

    impl Reply {
        pub(crate) fn chunks<I, T>(chunks: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: AsRef<[u8]>,
        {
            Reply::Chunks(chunks.into_iter().map(|c| c.as_ref().to_vec()).collect())
        }

        pub(crate) fn chunks_then_hang_up<I, T>(chunks: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: AsRef<[u8]>,
        {
            Reply::ChunksThenHangUp(chunks.into_iter().map(|c| c.as_ref().to_vec()).collect())
        }

        pub(crate) fn hang_up() -> Self {
            Reply::ChunksThenHangUp(Vec::new())
        }
    }

    /// Everything the code under test sent, shared with the test body.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptLog {
        pub(crate) writes: Vec<String>,
        pub(crate) shutdowns: usize,
    }

    /// A shell that replays scripted output in response to expected input.
    ///
    /// Reads block forever once the script has nothing queued, so callers'
    /// timeouts decide what happens next (tests run with paused time).
    pub(crate) struct ScriptedShell {
        pending: VecDeque<Vec<u8>>,
        script: VecDeque<(String, Reply)>,
        hung_up: bool,
        hang_up_when_drained: bool,
        log: Arc<Mutex<ScriptLog>>,
    }

    impl ScriptedShell {
        pub(crate) fn new() -> Self {
            Self {
                pending: VecDeque::new(),
                script: VecDeque::new(),
                hung_up: false,
                hang_up_when_drained: false,
                log: Arc::new(Mutex::new(ScriptLog::default())),
            }
        }

        /// Output available before anything is written (banners, prompts).
        pub(crate) fn greeting<I, T>(mut self, chunks: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: AsRef<[u8]>,
        {
            self.pending
                .extend(chunks.into_iter().map(|c| c.as_ref().to_vec()));
            self
        }

        /// End the stream once the greeting has been read.
        pub(crate) fn hang_up_after_greeting(mut self) -> Self {
            self.hang_up_when_drained = true;
            self
        }

        /// Expect `line` to be written next and answer with `reply`.
        pub(crate) fn expect(mut self, line: &str, reply: Reply) -> Self {
            self.script.push_back((line.to_string(), reply));
            self
        }

        pub(crate) fn log(&self) -> Arc<Mutex<ScriptLog>> {
            self.log.clone()
        }
    }

    impl Shell for ScriptedShell {
        async fn write_all(&mut self, data: &[u8]) -> Result<()> {
            if self.hung_up {
                return Err(ChannelError::Closed.into());
            }
            let written = String::from_utf8_lossy(data).to_string();
            self.log.lock().unwrap().writes.push(written.clone());

            let (expected, reply) = self
                .script
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected write {written:?}"));
            assert_eq!(written, expected, "scripted shell got the wrong input");

            match reply {
                Reply::Chunks(chunks) => self.pending.extend(chunks),
                Reply::ChunksThenHangUp(chunks) => {
                    self.pending.extend(chunks);
                    self.hang_up_when_drained = true;
                }
            }
            Ok(())
        }

        async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            if let Some(chunk) = self.pending.pop_front() {
                return Ok(Some(chunk));
            }
            if self.hang_up_when_drained {
                self.hung_up = true;
            }
            if self.hung_up {
                return Ok(None);
            }
            std::future::pending::<()>().await;
            Ok(None)
        }

        async fn shutdown(&mut self) -> Result<()> {
            self.log.lock().unwrap().shutdowns += 1;
            Ok(())
        }
    }
}
