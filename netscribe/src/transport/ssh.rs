//! SSH transport implementation using russh.

use std::sync::Arc;

use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, SshConfig};
use crate::channel::Shell;
use crate::error::{ChannelError, Result, TransportError};

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let handler = SshHandler {
            addr: config.socket_addr(),
        };

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        Self::authenticate(&mut session, &config).await?;
        debug!("ssh: authenticated to {} as {}", config.socket_addr(), config.username);

        Ok(Self { session, config })
    }

    /// Open a PTY channel with an interactive shell on this connection.
    pub async fn open_shell(&self) -> Result<SshShell> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(SshShell { channel })
    }

    /// Run one command on a fresh exec channel and collect both output
    /// streams until the channel closes.
    pub async fn exec(&self, command: &str) -> Result<ExecOutput> {
        let mut channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .exec(true, command)
            .await
            .map_err(TransportError::Ssh)?;

        let mut output = ExecOutput::default();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    output.stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                ChannelMsg::Close => break,
                other => trace!("ssh exec: ignoring {:?}", other),
            }
        }

        Ok(output)
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Host and port this transport is connected to.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Raw result of an exec channel.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Everything written to standard output.
    pub stdout: Vec<u8>,

    /// Everything written to standard error.
    pub stderr: Vec<u8>,

    /// Exit status, when the server reported one.
    pub exit_status: Option<u32>,
}

/// Interactive PTY shell on an SSH connection.
pub struct SshShell {
    channel: Channel<Msg>,
}

impl Shell for SshShell {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await.map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { ref data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(other) => trace!("ssh shell: ignoring {:?}", other),
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
///
/// Host keys are accepted without verification.
struct SshHandler {
    addr: String,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        debug!("ssh: accepting host key for {} without verification", self.addr);
        Ok(true)
    }
}
