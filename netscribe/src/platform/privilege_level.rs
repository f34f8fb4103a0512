//! Privilege levels and the escalation step that moves between them.

use crate::channel::Settle;

/// Privilege level of an interactive device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivilegeLevel {
    /// User EXEC mode (`router>`), or a device without privilege levels.
    #[default]
    Normal,
    /// Privileged EXEC mode (`router#`).
    Elevated,
}

impl PrivilegeLevel {
    /// Level of a freshly opened shell judged from everything it printed.
    ///
    /// Any unprivileged marker in `banner` means [`PrivilegeLevel::Normal`],
    /// even when later lines (syslog, MOTD) follow the prompt. Without one
    /// the shell is taken as [`PrivilegeLevel::Elevated`].
    pub fn from_banner(banner: &str, escalation: &Escalation) -> Self {
        if banner.contains(escalation.unprivileged_marker) {
            PrivilegeLevel::Normal
        } else {
            PrivilegeLevel::Elevated
        }
    }

    /// Guess the level from a prompt line using the markers of `escalation`.
    pub fn from_prompt(prompt: &str, escalation: &Escalation) -> Option<Self> {
        let prompt = prompt.trim_end();
        if prompt.ends_with(escalation.unprivileged_marker) {
            Some(PrivilegeLevel::Normal)
        } else if prompt.ends_with(escalation.elevated_marker) {
            Some(PrivilegeLevel::Elevated)
        } else {
            None
        }
    }
}

/// How to get from [`PrivilegeLevel::Normal`] to [`PrivilegeLevel::Elevated`].
#[derive(Debug, Clone)]
pub struct Escalation {
    /// Command that starts escalation (e.g., "enable").
    pub command: String,

    /// Character ending an unprivileged prompt.
    pub unprivileged_marker: char,

    /// Character ending a privileged prompt.
    pub elevated_marker: char,

    /// Wait applied before inspecting the prompt and after each line sent.
    pub settle: Settle,
}

impl Escalation {
    /// Create an escalation step using the given command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            unprivileged_marker: '>',
            elevated_marker: '#',
            settle: Settle::default(),
        }
    }

    /// Set the prompt markers.
    pub fn with_markers(mut self, unprivileged: char, elevated: char) -> Self {
        self.unprivileged_marker = unprivileged;
        self.elevated_marker = elevated;
        self
    }

    /// Set the settle strategy.
    pub fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prompt() {
        let enable = Escalation::new("enable");
        assert_eq!(
            PrivilegeLevel::from_prompt("router>", &enable),
            Some(PrivilegeLevel::Normal)
        );
        assert_eq!(
            PrivilegeLevel::from_prompt("router# ", &enable),
            Some(PrivilegeLevel::Elevated)
        );
        assert_eq!(PrivilegeLevel::from_prompt("Last login: today", &enable), None);
    }

    #[test]
    fn test_from_banner() {
        let enable = Escalation::new("enable");
        let greeting = "\r\nrouter>\r\n*Mar  1 00:00:07: %SYS-5-CONFIG_I: Configured from console\r\n";
        assert_eq!(
            PrivilegeLevel::from_banner(greeting, &enable),
            PrivilegeLevel::Normal
        );
        assert_eq!(
            PrivilegeLevel::from_banner("Last login: today\r\nrouter#", &enable),
            PrivilegeLevel::Elevated
        );
        assert_eq!(PrivilegeLevel::from_banner("", &enable), PrivilegeLevel::Elevated);
    }

    #[test]
    fn test_custom_markers() {
        let su = Escalation::new("su -").with_markers('$', '#');
        assert_eq!(
            PrivilegeLevel::from_prompt("user@host:~$", &su),
            Some(PrivilegeLevel::Normal)
        );
        assert_eq!(su.settle.upper_bound(), std::time::Duration::from_secs(1));
    }
}
