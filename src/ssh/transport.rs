//! Secure-shell transport seam
//!
//! The client never talks to `russh` directly; it goes through these traits so
//! the connection lifecycle and executor can be exercised without a server.
//! [`SshTransport`](super::connection::SshTransport) is the real implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::config::Credentials;
use crate::error::Result;
use crate::logger::ClientLogger;

/// Raw bytes and status collected from one exec channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit status from the channel, `None` if the channel closed without one
    pub exit_status: Option<u32>,

    /// Standard output bytes
    pub stdout: Vec<u8>,

    /// Standard error bytes (extended data stream 1)
    pub stderr: Vec<u8>,
}

/// Opens authenticated sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Session type produced by this transport
    type Session: RemoteSession;

    /// Connect and authenticate. `timeout` bounds the whole handshake.
    ///
    /// Must fail with `Authentication`, `Unreachable` or `HandshakeTimeout`
    /// where those apply, and must not leave a session open on failure.
    /// Anything the session logs goes through `logger`.
    async fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
        logger: &ClientLogger,
    ) -> Result<Self::Session>;
}

/// A live, authenticated session
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `command` on a new exec channel. If `stdin` is given it is written
    /// to the process, followed by a newline, and the stream is left open.
    async fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<RawOutput>;

    /// Copy a local file to `remote` over SFTP
    async fn upload(&mut self, local: &Path, remote: &str) -> Result<()>;

    /// Copy `remote` to a local file over SFTP
    async fn download(&mut self, remote: &str, local: &Path) -> Result<()>;

    /// Disconnect the session
    async fn close(&mut self);
}
