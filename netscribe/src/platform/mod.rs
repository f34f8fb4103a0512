//! Platform definitions for the supported targets.
//!
//! A platform bundles the protocol, the settle and read strategy, the output
//! classifier, privilege escalation, and how fatal errors are worded.

mod definition;
mod privilege_level;
pub mod vendors;

use std::fmt;
use std::str::FromStr;

pub use definition::{CommandMode, PlatformDefinition};
pub use privilege_level::{Escalation, PrivilegeLevel};

use crate::error::{DriverError, Error};

/// Built-in targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux host over SSH, one exec channel per command.
    LinuxSsh,
    /// Cisco IOS over an SSH interactive shell with enable escalation.
    CiscoSsh,
    /// Cisco IOS over Telnet with a prompt-driven login.
    CiscoTelnet,
}

impl Platform {
    /// All built-in platforms.
    pub const ALL: [Platform; 3] = [Platform::LinuxSsh, Platform::CiscoSsh, Platform::CiscoTelnet];

    /// Stable name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Platform::LinuxSsh => "linux-ssh",
            Platform::CiscoSsh => "cisco-ssh",
            Platform::CiscoTelnet => "cisco-telnet",
        }
    }

    /// Build the platform definition.
    pub fn definition(self) -> PlatformDefinition {
        match self {
            Platform::LinuxSsh => vendors::linux::platform(),
            Platform::CiscoSsh => vendors::cisco_ios::ssh_platform(),
            Platform::CiscoTelnet => vendors::cisco_ios::telnet_platform(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                DriverError::InvalidConfig {
                    message: format!("unknown platform '{}'", s),
                }
                .into()
            })
    }
}

/// When a front end should report failure through its exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Non-zero exit when the session failed before running any command.
    FailOnFatal,
    /// Always exit zero; failures are only visible in the transcript.
    #[default]
    AlwaysSucceed,
}

/// Session phase in which a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Login,
    Command,
}

/// Wording of fatal error entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStyle {
    /// `Telnet: ...` messages that name the failing phase.
    Telnet,
    /// One `An error occurred: ...` message for every phase.
    Ssh,
}

impl FaultStyle {
    /// Content of the error entry for `err` raised during `stage`.
    pub fn describe(self, stage: Stage, err: &Error) -> String {
        match self {
            FaultStyle::Ssh => format!("An error occurred: {}", err.detail()),
            FaultStyle::Telnet => match stage {
                Stage::Connect => format!("Telnet: Failed to connect: {}", err.detail()),
                Stage::Login => format!("Login failed: {}", err.detail()),
                Stage::Command if err.is_eof() => {
                    "Telnet: Connection lost or EOF encountered".to_string()
                }
                Stage::Command => format!("Telnet: Error sending command: {}", err.detail()),
            },
        }
    }

    /// Content of the entry recorded when no commands were requested. SSH
    /// platforms record nothing.
    pub fn connected(self, host: &str) -> Option<String> {
        match self {
            FaultStyle::Telnet => Some(format!("Telnet: Successfully connected to {}", host)),
            FaultStyle::Ssh => None,
        }
    }
}
