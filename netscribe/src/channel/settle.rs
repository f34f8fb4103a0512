//! Output stabilization strategies.
//!
//! Interactive CLIs give no completion signal for a command. A `Settle`
//! strategy decides how long to keep waiting before the output is taken.

use std::time::Duration;

use regex::bytes::Regex;

/// How to wait for a remote shell to finish producing output.
#[derive(Debug, Clone)]
pub enum Settle {
    /// Sleep a fixed amount of time without reading.
    FixedDelay(Duration),

    /// Read until no new output arrives for `quiet`, giving up after `max`.
    Idle { quiet: Duration, max: Duration },

    /// Read until `pattern` matches the tail of the output, giving up after
    /// `timeout`.
    Prompt { pattern: Regex, timeout: Duration },
}

impl Settle {
    /// A fixed delay of whole seconds.
    pub fn seconds(secs: u64) -> Self {
        Settle::FixedDelay(Duration::from_secs(secs))
    }

    /// The longest this strategy can wait.
    pub fn upper_bound(&self) -> Duration {
        match self {
            Settle::FixedDelay(delay) => *delay,
            Settle::Idle { max, .. } => *max,
            Settle::Prompt { timeout, .. } => *timeout,
        }
    }
}

impl Default for Settle {
    fn default() -> Self {
        Settle::seconds(1)
    }
}

/// How much output to take once the shell has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Everything received so far plus anything still arriving, up to the
    /// channel's drain limit.
    #[default]
    Drain,

    /// Wait for output, then take at most this many bytes. Anything beyond
    /// stays buffered for the next read.
    Bounded(usize),
}
