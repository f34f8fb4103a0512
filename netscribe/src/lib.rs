//! # Netscribe
//!
//! Async command automation for Linux hosts and Cisco IOS devices over SSH
//! and Telnet.
//!
//! A [`Session`] connects, authenticates (Telnet login, Cisco `enable`),
//! runs an ordered list of commands and returns a [`Transcript`]: one
//! `command` entry per command followed by its `output` or `error` entry.
//! Fatal errors never escape as `Err`; they become the last entry.
//!
//! ## Features
//!
//! - SSH via russh, both exec channels and PTY shells
//! - Telnet over tokio TCP with option refusal
//! - Prompt-driven Telnet login state machine
//! - Configurable output settling and classification per platform
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netscribe::{Platform, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netscribe::Error> {
//!     let mut session = SessionBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .platform(Platform::CiscoTelnet)
//!         .build()?;
//!
//!     let transcript = session.run(&["show clock".to_string()]).await;
//!     for entry in transcript.iter() {
//!         println!("{:?}: {}", entry.kind(), entry.content());
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transcript;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CommandOutput, Credentials, OutputClassifier, Session, SessionBuilder, SessionConfig,
};
pub use error::{Error, ErrorKind, Result};
pub use platform::{ExitPolicy, Platform, PlatformDefinition, PrivilegeLevel};
pub use transcript::{Entry, EntryKind, Outcome, Transcript};
