//! Telnet transport over tokio TCP.
//!
//! Connecting only opens the byte stream. Authentication is prompt driven
//! and lives in the driver's login state machine.

pub mod negotiation;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use self::negotiation::{Negotiator, escape};
use super::config::TelnetConfig;
use crate::channel::Shell;
use crate::error::{ChannelError, Result, TransportError};

const READ_BUFFER_SIZE: usize = 4096;

/// Telnet connection. Generic over the stream so tests can substitute an
/// in-memory one.
pub struct TelnetTransport<S = TcpStream> {
    stream: S,
    negotiator: Negotiator,

    /// Option replies not yet written to the peer.
    outbox: Vec<u8>,

    read_buf: Box<[u8]>,
}

impl TelnetTransport<TcpStream> {
    /// Open a TCP connection to the Telnet server.
    pub async fn connect(config: &TelnetConfig) -> Result<Self> {
        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("telnet: could not set TCP_NODELAY: {}", e);
        }

        debug!("telnet: connected to {}", config.socket_addr());
        Ok(Self::from_stream(stream))
    }
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-open stream.
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream,
            negotiator: Negotiator::new(),
            outbox: Vec::new(),
            read_buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Write any pending option replies.
    async fn flush_outbox(&mut self) -> Result<()> {
        if self.outbox.is_empty() {
            return Ok(());
        }
        let replies = std::mem::take(&mut self.outbox);
        trace!("telnet: sending {} bytes of option replies", replies.len());
        self.stream
            .write_all(&replies)
            .await
            .map_err(ChannelError::Io)?;
        Ok(())
    }
}

impl<S> Shell for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.flush_outbox().await?;
        self.stream
            .write_all(&escape(data))
            .await
            .map_err(ChannelError::Io)?;
        self.stream.flush().await.map_err(ChannelError::Io)?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            self.flush_outbox().await?;

            let n = self
                .stream
                .read(&mut self.read_buf)
                .await
                .map_err(ChannelError::Io)?;
            if n == 0 {
                return Ok(None);
            }

            let data = self
                .negotiator
                .decode(&self.read_buf[..n], &mut self.outbox);
            if !data.is_empty() {
                return Ok(Some(data));
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(ChannelError::Io)?;
        Ok(())
    }
}
