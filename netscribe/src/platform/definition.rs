//! Platform definition: everything that differs between supported targets.

use std::fmt;
use std::sync::Arc;

use super::privilege_level::Escalation;
use super::{ExitPolicy, FaultStyle};
use crate::channel::{ReadPolicy, Settle};
use crate::driver::{FailurePatterns, OutputClassifier};
use crate::transport::Protocol;

/// How commands reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// A fresh exec channel per command, with separate stdout and stderr.
    Exec,
    /// Lines typed into one interactive shell.
    Shell,
}

/// Platform definition containing all target-specific behavior.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "linux-ssh", "cisco-telnet").
    pub name: String,

    /// Wire protocol.
    pub protocol: Protocol,

    /// How commands are run.
    pub command_mode: CommandMode,

    /// Wait after each command before reading output.
    pub settle: Settle,

    /// How much output to take after settling.
    pub read_policy: ReadPolicy,

    /// Decides between output and error entries.
    pub classifier: Arc<dyn OutputClassifier>,

    /// Privilege escalation run after the shell opens, if any.
    pub escalation: Option<Escalation>,

    /// Wording of fatal error entries.
    pub fault_style: FaultStyle,

    /// Process exit status rule for front ends.
    pub exit_policy: ExitPolicy,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    ///
    /// Defaults to an interactive shell with a one second settle, a drain
    /// read and no failure patterns.
    pub fn new(name: impl Into<String>, protocol: Protocol) -> Self {
        let fault_style = match protocol {
            Protocol::Ssh => FaultStyle::Ssh,
            Protocol::Telnet => FaultStyle::Telnet,
        };
        Self {
            name: name.into(),
            protocol,
            command_mode: CommandMode::Shell,
            settle: Settle::default(),
            read_policy: ReadPolicy::default(),
            classifier: Arc::new(FailurePatterns::new()),
            escalation: None,
            fault_style,
            exit_policy: ExitPolicy::default(),
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Set the command mode.
    pub fn with_command_mode(mut self, mode: CommandMode) -> Self {
        self.command_mode = mode;
        self
    }

    /// Set the settle strategy used after each command.
    pub fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }

    /// Set the read policy used after each command.
    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Set the output classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn OutputClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the privilege escalation step.
    pub fn with_escalation(mut self, escalation: Escalation) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Set the wording of fatal errors.
    pub fn with_fault_style(mut self, style: FaultStyle) -> Self {
        self.fault_style = style;
        self
    }

    /// Set the exit status rule.
    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("command_mode", &self.command_mode)
            .field("settle", &self.settle)
            .field("read_policy", &self.read_policy)
            .field("classifier", &"<OutputClassifier>")
            .field("escalation", &self.escalation)
            .field("fault_style", &self.fault_style)
            .field("exit_policy", &self.exit_policy)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .finish()
    }
}
