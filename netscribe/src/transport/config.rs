//! Connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// Wire protocol used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// SSH with password authentication at connect time.
    Ssh,
    /// Plain Telnet; authentication happens on the byte stream.
    Telnet,
}

impl Protocol {
    /// The well-known port for this protocol.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ssh => 22,
            Protocol::Telnet => 23,
        }
    }
}

/// SSH connection configuration.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl SshConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),
}

/// Telnet connection configuration.
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Telnet port (default: 23).
    pub port: u16,

    /// Connection timeout.
    pub timeout: Duration,
}

impl TelnetConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
