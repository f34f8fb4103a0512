//! Transport layer: SSH via russh, Telnet over tokio TCP.
//!
//! This module provides the low-level connection management: connect,
//! SSH authentication, and opening interactive or exec channels.

pub mod config;
mod ssh;
pub mod telnet;

pub use config::{AuthMethod, Protocol, SshConfig, TelnetConfig};
pub use ssh::{ExecOutput, SshShell, SshTransport};
pub use telnet::TelnetTransport;
