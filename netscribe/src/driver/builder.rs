//! Builder for creating sessions.

use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use super::login::LoginPolicy;
use super::session::{Credentials, Session, SessionConfig};
use crate::error::{DriverError, Result};
use crate::platform::{Platform, PlatformDefinition};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use netscribe::{Platform, SessionBuilder};
///
/// # async fn example() -> Result<(), netscribe::Error> {
/// let mut session = SessionBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .enable_password("enable-secret")
///     .platform(Platform::CiscoSsh)
///     .build()?;
///
/// let transcript = session.run(&["show version".to_string()]).await;
/// println!("{}", serde_json::to_string(transcript.entries()).unwrap());
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: Option<u16>,
    username: Option<String>,
    password: Option<SecretString>,
    enable_password: Option<SecretString>,
    platform: Option<Platform>,
    custom_platform: Option<PlatformDefinition>,
    timeout: Duration,
    login_policy: Option<LoginPolicy>,
    verbose: bool,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            enable_password: None,
            platform: None,
            custom_platform: None,
            timeout: Duration::from_secs(10),
            login_policy: None,
            verbose: false,
        }
    }

    /// Set the port (default: the protocol's well-known port).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password: String = password.into();
        self.password = Some(SecretString::from(password));
        self
    }

    /// Set the enable password used by privilege escalation.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        let password: String = password.into();
        self.enable_password = Some(SecretString::from(password));
        self
    }

    /// Use a built-in platform.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Set the timeout for connecting and for each prompt wait (default: 10s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the per-state Telnet login timeouts.
    pub fn login_policy(mut self, policy: LoginPolicy) -> Self {
        self.login_policy = Some(policy);
        self
    }

    /// Log login step timings at `info`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build the session.
    ///
    /// This validates the configuration but does not connect; that happens
    /// in [`Session::run`].
    pub fn build(self) -> Result<Session> {
        if self.host.trim().is_empty() {
            return Err(invalid("Host is required"));
        }

        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| invalid("Username is required"))?;

        let platform = match (self.custom_platform, self.platform) {
            (Some(custom), _) => custom,
            (None, Some(platform)) => platform.definition(),
            (None, None) => return Err(invalid("Platform must be specified")),
        };

        if self.timeout.is_zero() {
            return Err(invalid("Timeout must be greater than zero"));
        }

        if self.enable_password.is_some() && platform.escalation.is_none() {
            debug!("{} has no escalation step, enable password unused", platform.name);
        }

        let port = self.port.unwrap_or_else(|| platform.protocol.default_port());

        let mut config = SessionConfig::with_timeout(self.timeout);
        config.verbose = self.verbose;
        if let Some(policy) = self.login_policy {
            config.login = policy;
        }

        let credentials = Credentials {
            username,
            password: self.password,
            enable_password: self.enable_password,
        };

        Ok(Session::new(self.host, port, credentials, platform, config))
    }
}

fn invalid(message: &str) -> crate::error::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}
