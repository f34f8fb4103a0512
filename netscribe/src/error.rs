//! Error types for netscribe.
//!
//! Errors never cross the [`Session::run`](crate::driver::Session::run)
//! boundary: the session converts each one into an error entry at the point
//! of failure. Inside the crate they travel as ordinary `Result`s.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netscribe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level errors (SSH or Telnet).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Errors on an open interactive stream.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Login or privilege-escalation handshake errors.
    #[error("Login error: {0}")]
    Login(#[from] LoginError),

    /// Driver configuration errors.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Transport layer errors (connect, SSH authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (reads and writes on a live shell).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// The remote side closed the stream.
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// I/O error on the underlying socket
    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Login and privilege-escalation errors. All of them are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// An expected prompt did not show up in time.
    #[error("timed out after {timeout:?} waiting for '{prompt}'")]
    PromptTimeout { prompt: String, timeout: Duration },

    /// The stream failed while waiting for a prompt.
    #[error("{0}")]
    Io(String),

    /// The device sits at an unprivileged prompt and no enable password was given.
    #[error("Enable password required but not provided")]
    EnablePasswordMissing,
}

/// Driver layer errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Coarse classification of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, refused, handshake: nothing was opened.
    Connection,
    /// Authentication or escalation failed: no command ran.
    Login,
    /// The stream went away mid-session.
    TransportDropped,
    /// The caller asked for something impossible.
    Config,
}

impl Error {
    /// Map this error onto the transcript-level taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(TransportError::AuthenticationFailed { .. }) => ErrorKind::Login,
            Error::Transport(_) => ErrorKind::Connection,
            Error::Channel(_) => ErrorKind::TransportDropped,
            Error::Login(_) => ErrorKind::Login,
            Error::Driver(_) => ErrorKind::Config,
        }
    }

    /// Whether the remote side closed the stream (end-of-file).
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Closed))
    }
    /// The message of the underlying layer error, without the layer prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::Transport(e) => e.to_string(),
            Error::Channel(e) => e.to_string(),
            Error::Login(e) => e.to_string(),
            Error::Driver(e) => e.to_string(),
        }
    }
}

/// Result type alias using netscribe's Error.
pub type Result<T> = std::result::Result<T, Error>;
