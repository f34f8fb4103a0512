//! Session orchestration: connect, authenticate, run commands, close.

use std::time::Duration;

use log::{Level, debug, log, warn};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::classify::OutputClassifier;
use super::dispatch::{CommandRunner, ExecRunner, ShellRunner, dispatch};
use super::login::{LoginPolicy, login};
use super::privilege::escalate;
use crate::channel::{ChannelConfig, Shell, ShellChannel};
use crate::error::Error;
use crate::platform::{CommandMode, PlatformDefinition, PrivilegeLevel, Stage};
use crate::transcript::{Entry, Transcript};
use crate::transport::{AuthMethod, Protocol, SshConfig, SshTransport, TelnetConfig, TelnetTransport};

/// Login material for a device.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Option<SecretString>,

    /// Only used by platforms with an escalation step.
    pub enable_password: Option<SecretString>,
}

/// Per-session tunables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connect timeout, also the default for prompt waits and bounded reads.
    pub timeout: Duration,

    /// Log login step timings at `info` instead of `debug`.
    pub verbose: bool,

    /// Prompt waits of the Telnet login.
    pub login: LoginPolicy,

    /// Shell channel behavior.
    pub channel: ChannelConfig,
}

impl SessionConfig {
    /// A configuration where every wait uses `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            verbose: false,
            login: LoginPolicy::uniform(timeout),
            channel: ChannelConfig {
                timeout,
                ..ChannelConfig::default()
            },
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }
}

/// A device session on one platform.
///
/// Nothing happens on the network until [`Session::run`], which owns the
/// connection for its duration and always closes it before returning.
#[derive(Debug)]
pub struct Session {
    host: String,
    port: u16,
    credentials: Credentials,
    platform: PlatformDefinition,
    config: SessionConfig,
    privilege: PrivilegeLevel,
}

impl Session {
    pub(crate) fn new(
        host: String,
        port: u16,
        credentials: Credentials,
        platform: PlatformDefinition,
        config: SessionConfig,
    ) -> Self {
        Self {
            host,
            port,
            credentials,
            platform,
            config,
            privilege: PrivilegeLevel::default(),
        }
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The platform definition in use.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Privilege level reached by the last run.
    pub fn privilege(&self) -> PrivilegeLevel {
        self.privilege
    }

    /// Connect, authenticate, run `commands` in order, and close.
    ///
    /// Never fails: every error ends up as the last entry of the returned
    /// transcript. An empty `commands` only checks that login works.
    pub async fn run(&mut self, commands: &[String]) -> Transcript {
        let started = Instant::now();
        self.privilege = PrivilegeLevel::default();

        let transcript = match self.platform.protocol {
            Protocol::Telnet => self.run_telnet(commands).await,
            Protocol::Ssh => self.run_ssh(commands).await,
        };

        let level = if self.config.verbose { Level::Info } else { Level::Debug };
        log!(
            level,
            "{} session to {}:{} finished in {:.3?} ({:?}, {} entries)",
            self.platform.name,
            self.host,
            self.port,
            started.elapsed(),
            transcript.outcome(),
            transcript.len()
        );
        transcript
    }

    async fn run_telnet(&mut self, commands: &[String]) -> Transcript {
        let config = TelnetConfig {
            host: self.host.clone(),
            port: self.port,
            timeout: self.config.timeout,
        };
        match TelnetTransport::connect(&config).await {
            Ok(telnet) => self.run_shell(telnet, commands).await,
            Err(e) => self.fatal(Stage::Connect, &e),
        }
    }

    async fn run_ssh(&mut self, commands: &[String]) -> Transcript {
        let auth = match &self.credentials.password {
            Some(password) => AuthMethod::Password(SecretString::from(
                password.expose_secret().to_owned(),
            )),
            None => AuthMethod::None,
        };
        let config = SshConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.credentials.username.clone(),
            auth,
            timeout: self.config.timeout,
            terminal_width: self.platform.terminal_width,
            terminal_height: self.platform.terminal_height,
        };

        let transport = match SshTransport::connect(config).await {
            Ok(transport) => transport,
            Err(e) => return self.fatal(Stage::Connect, &e),
        };

        let transcript = match self.platform.command_mode {
            CommandMode::Exec => {
                let mut runner = ExecRunner::new(&transport);
                self.record(&mut runner, commands).await
            }
            CommandMode::Shell => match transport.open_shell().await {
                Ok(shell) => self.run_shell(shell, commands).await,
                Err(e) => self.fatal(Stage::Connect, &e),
            },
        };

        if let Err(e) = transport.close().await {
            warn!("closing SSH connection to {}: {}", self.host, e);
        }
        transcript
    }

    /// Drive an open interactive shell: login or escalation, then the
    /// commands. The shell is closed before returning.
    pub(crate) async fn run_shell<S: Shell>(&mut self, shell: S, commands: &[String]) -> Transcript {
        let mut channel = ShellChannel::new(shell, self.config.channel.clone());
        let transcript = self.drive_shell(&mut channel, commands).await;
        if let Err(e) = channel.close().await {
            warn!("closing shell to {}: {}", self.host, e);
        }
        transcript
    }

    async fn drive_shell<S: Shell>(
        &mut self,
        channel: &mut ShellChannel<S>,
        commands: &[String],
    ) -> Transcript {
        if self.platform.protocol == Protocol::Telnet {
            if let Err(e) = login(
                channel,
                &self.credentials,
                &self.config.login,
                self.config.verbose,
            )
            .await
            {
                return self.fatal(Stage::Login, &e);
            }
            self.privilege = PrivilegeLevel::Elevated;
        }

        if let Some(escalation) = &self.platform.escalation {
            match escalate(channel, escalation, self.credentials.enable_password.as_ref()).await {
                Ok(level) => self.privilege = level,
                Err(e) => return self.fatal(Stage::Login, &e),
            }
        }

        let mut runner = ShellRunner::new(
            channel,
            self.platform.settle.clone(),
            self.platform.read_policy,
        );
        self.record(&mut runner, commands).await
    }

    /// Run the commands. With none, Telnet records a connection check and
    /// SSH leaves the transcript empty.
    async fn record<R: CommandRunner>(&self, runner: &mut R, commands: &[String]) -> Transcript {
        let mut transcript = Transcript::new();
        if commands.is_empty() {
            if let Some(connected) = self.platform.fault_style.connected(&self.host) {
                transcript.push(Entry::output(connected));
            }
            return transcript;
        }

        let classifier: &dyn OutputClassifier = self.platform.classifier.as_ref();
        if let Err(e) = dispatch(runner, commands, classifier, &mut transcript).await {
            warn!(
                "{}: aborted after {} of {} commands: {}",
                self.host,
                transcript.len() / 2,
                commands.len(),
                e
            );
            transcript.abort(self.platform.fault_style.describe(Stage::Command, &e));
        }
        transcript
    }

    fn fatal(&self, stage: Stage, err: &Error) -> Transcript {
        warn!("{}: {:?} failed: {}", self.host, stage, err);
        debug!("{}: error kind {:?}", self.host, err.kind());
        Transcript::failed(self.platform.fault_style.describe(stage, err))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use super::*;
    use crate::channel::testing::{Reply, ScriptedShell};
    use crate::channel::{ReadPolicy, Settle};
    use crate::platform::{Escalation, Platform};
    use crate::transcript::{EntryKind, Outcome};

    fn credentials(password: Option<&str>, enable: Option<&str>) -> Credentials {
        Credentials {
            username: "admin".into(),
            password: password.map(|p| SecretString::from(p.to_string())),
            enable_password: enable.map(|p| SecretString::from(p.to_string())),
        }
    }

    fn session(platform: Platform, creds: Credentials) -> Session {
        let definition = platform.definition();
        let port = definition.protocol.default_port();
        Session::new("10.0.0.5".into(), port, creds, definition, SessionConfig::default())
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn telnet_login(shell: ScriptedShell) -> ScriptedShell {
        shell
            .greeting(["\r\nUser Access Verification\r\n\r\nUsername: "])
            .expect("admin\n", Reply::chunks(["admin\r\nPassword: "]))
            .expect("cisco\n", Reply::chunks(["\r\nrouter#"]))
            .expect("terminal length 0\n", Reply::chunks(["terminal length 0\r\nrouter#"]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_telnet_commands_in_order() {
        let shell = telnet_login(ScriptedShell::new())
            .expect(
                "show clock\n",
                Reply::chunks(["show clock\r\n*10:00:00.000 UTC Mon\r\nrouter#"]),
            )
            .expect(
                "show bogus\n",
                Reply::chunks(["show bogus\r\n% Invalid input detected\r\nrouter#"]),
            );
        let log = shell.log();
        let mut session = session(Platform::CiscoTelnet, credentials(Some("cisco"), None));

        let transcript = session
            .run_shell(shell, &commands(&["show clock", "show bogus"]))
            .await;

        let kinds: Vec<_> = transcript.iter().map(Entry::kind).collect();
        assert_eq!(
            kinds,
            [EntryKind::Command, EntryKind::Output, EntryKind::Command, EntryKind::Error]
        );
        assert_eq!(transcript.entries()[0].content(), "show clock");
        assert_eq!(
            transcript.entries()[3].content(),
            "show bogus\r\n% Invalid input detected\r\nrouter#"
        );
        assert_eq!(transcript.outcome(), Outcome::Completed);
        assert_eq!(session.privilege(), PrivilegeLevel::Elevated);
        assert_eq!(log.lock().unwrap().shutdowns, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_telnet_without_commands_confirms_connection() {
        let shell = telnet_login(ScriptedShell::new());
        let mut session = session(Platform::CiscoTelnet, credentials(Some("cisco"), None));

        let transcript = session.run_shell(shell, &[]).await;

        assert_eq!(
            transcript.entries(),
            [Entry::output("Telnet: Successfully connected to 10.0.0.5")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_telnet_username_prompt_never_appears() {
        let shell = ScriptedShell::new().greeting(["Welcome\r\n"]);
        let log = shell.log();
        let mut session = session(Platform::CiscoTelnet, credentials(None, None));

        let transcript = session.run_shell(shell, &commands(&["show clock"])).await;

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.outcome(), Outcome::Failed);
        let entry = &transcript.entries()[0];
        assert_eq!(entry.kind(), EntryKind::Error);
        assert!(entry.content().starts_with("Login failed: "), "{}", entry.content());
        assert!(log.lock().unwrap().writes.is_empty());
        assert_eq!(log.lock().unwrap().shutdowns, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_telnet_connection_lost_mid_loop() {
        let shell = telnet_login(ScriptedShell::new())
            .expect("show clock\n", Reply::chunks_then_hang_up(["*10:00 UTC\r\nrouter#"]));
        let mut session = session(Platform::CiscoTelnet, credentials(Some("cisco"), None));

        let transcript = session
            .run_shell(shell, &commands(&["show clock", "show users", "show version"]))
            .await;

        assert_eq!(transcript.outcome(), Outcome::Aborted);
        assert_eq!(
            transcript.entries(),
            [
                Entry::command("show clock"),
                Entry::output("*10:00 UTC\r\nrouter#"),
                Entry::error("Telnet: Connection lost or EOF encountered"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cisco_ssh_escalates_then_runs() {
        let shell = ScriptedShell::new()
            .greeting(["\r\nrouter>"])
            .expect("enable\n", Reply::chunks(["enable\r\nPassword: "]))
            .expect("s3cret\n", Reply::chunks(["\r\nrouter#"]))
            .expect(
                "show version\n",
                Reply::chunks(["show version\r\nCisco IOS Software\r\nrouter#"]),
            );
        let mut session = session(Platform::CiscoSsh, credentials(Some("x"), Some("s3cret")));

        let transcript = session.run_shell(shell, &commands(&["show version"])).await;

        assert_eq!(
            transcript.entries(),
            [
                Entry::command("show version"),
                Entry::output("show version\r\nCisco IOS Software\r\nrouter#"),
            ]
        );
        assert_eq!(session.privilege(), PrivilegeLevel::Elevated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cisco_ssh_missing_enable_password() {
        let shell = ScriptedShell::new()
            .greeting(["router>"])
            .expect("enable\n", Reply::chunks(["Password: "]));
        let log = shell.log();
        let mut session = session(Platform::CiscoSsh, credentials(Some("x"), None));

        let transcript = session.run_shell(shell, &commands(&["show version"])).await;

        assert_eq!(
            transcript.entries(),
            [Entry::error(
                "An error occurred: Enable password required but not provided"
            )]
        );
        assert_eq!(transcript.outcome(), Outcome::Failed);
        assert_eq!(log.lock().unwrap().writes, ["enable\n"]);
        assert_eq!(log.lock().unwrap().shutdowns, 1);
    }

    #[tokio::test]
    async fn test_telnet_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut session = Session::new(
            "127.0.0.1".into(),
            port,
            credentials(None, None),
            Platform::CiscoTelnet.definition(),
            SessionConfig::with_timeout(Duration::from_secs(2)),
        );
        let transcript = session.run(&commands(&["show clock"])).await;

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.outcome(), Outcome::Failed);
        assert!(
            transcript.entries()[0]
                .content()
                .starts_with("Telnet: Failed to connect: ")
        );
    }

    #[tokio::test]
    async fn test_telnet_end_to_end_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();

            write.write_all(b"Username: ").await.unwrap();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "admin");
            write.write_all(b"Password: ").await.unwrap();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "cisco");
            write.write_all(b"\r\nrouter#").await.unwrap();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "terminal length 0");
            write.write_all(b"\r\nrouter#").await.unwrap();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "show clock");
            write
                .write_all(b"show clock\r\n*10:00:00.000 UTC Mon\r\nrouter#")
                .await
                .unwrap();
            assert!(lines.next_line().await.unwrap().is_none());
        });

        let definition = Platform::CiscoTelnet
            .definition()
            .with_settle(Settle::FixedDelay(Duration::from_millis(200)))
            .with_read_policy(ReadPolicy::Drain);
        let mut session = Session::new(
            "127.0.0.1".into(),
            port,
            credentials(Some("cisco"), None),
            definition,
            SessionConfig::with_timeout(Duration::from_secs(5)),
        );

        let transcript = session.run(&commands(&["show clock"])).await;
        assert_eq!(
            transcript.entries(),
            [
                Entry::command("show clock"),
                Entry::output("show clock\r\n*10:00:00.000 UTC Mon\r\nrouter#"),
            ]
        );
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_escalation_marker() {
        let definition = PlatformDefinition::new("lab", Protocol::Ssh)
            .with_escalation(Escalation::new("su -").with_markers('$', '#'));
        let shell = ScriptedShell::new()
            .greeting(["user@lab:~$ "])
            .expect("su -\n", Reply::chunks(["Password: "]))
            .expect("root\n", Reply::chunks(["\r\nroot@lab:~# "]));
        let mut session = Session::new(
            "lab".into(),
            22,
            credentials(Some("x"), Some("root")),
            definition,
            SessionConfig::default(),
        );

        let transcript = session.run_shell(shell, &[]).await;
        assert!(transcript.is_empty());
        assert_eq!(transcript.outcome(), Outcome::Completed);
        assert_eq!(session.privilege(), PrivilegeLevel::Elevated);
    }
}
