//! SSH connection lifecycle
//!
//! [`acquire`] opens one authenticated session per operation and classifies
//! failures; [`Connection`] owns that session until it is closed exactly once.
//! [`SshTransport`] is the `russh` implementation of the transport seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::config::Credentials;
use super::handler::SshHandler;
use super::transport::{RawOutput, RemoteSession, Transport};
use crate::error::{RemoteError, Result};
use crate::logger::ClientLogger;

/// An acquired session, released by [`Connection::close`]
///
/// Dropping an unclosed connection (for example when the owning future is
/// cancelled) still drops the session, which tears it down.
pub struct Connection<S: RemoteSession> {
    session: Option<S>,
    pub(crate) elevation_secret: Option<String>,
    pub(crate) logger: ClientLogger,
}

impl<S: RemoteSession> Connection<S> {
    pub(crate) fn new(session: S, credentials: &Credentials, logger: ClientLogger) -> Self {
        Self {
            session: Some(session),
            elevation_secret: credentials.elevation_secret().map(str::to_string),
            logger,
        }
    }

    /// Whether the session is still held
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| RemoteError::connection("SSH connection already closed"))
    }

    /// Close the session. Consumes the connection so it cannot be closed twice.
    pub async fn close(mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
            self.logger.closed();
        }
    }
}

impl<S: RemoteSession> Drop for Connection<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.logger.dropped_open();
        }
    }
}

impl<S: RemoteSession> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.is_open())
            .field("elevation", &self.elevation_secret.is_some())
            .finish()
    }
}

/// Acquire an authenticated connection
///
/// Every attempt is logged with its outcome before any error is returned.
pub async fn acquire<T: Transport>(
    transport: &T,
    credentials: &Credentials,
    handshake_timeout: Duration,
    logger: &ClientLogger,
) -> Result<Connection<T::Session>> {
    let address = credentials.address();
    logger.connecting(&address, &credentials.username);

    match transport
        .connect(credentials, handshake_timeout, logger)
        .await
    {
        Ok(session) => {
            logger.connected(&address, &credentials.username);
            Ok(Connection::new(session, credentials, logger.clone()))
        }
        Err(e) => {
            logger.connect_failed(&address, &e);
            Err(e)
        }
    }
}

/// `russh`-backed transport
#[derive(Clone)]
pub struct SshTransport {
    config: Arc<client::Config>,
}

impl SshTransport {
    /// Create a transport with russh defaults
    pub fn new() -> Self {
        Self {
            config: Arc::new(client::Config::default()),
        }
    }

    /// Create a transport with a custom russh client configuration
    pub fn with_config(config: client::Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    async fn handshake(
        &self,
        credentials: &Credentials,
        logger: &ClientLogger,
    ) -> Result<Handle<SshHandler>> {
        let address = credentials.address();

        // Separate TCP connect so transport failures are told apart from SSH ones
        let stream = TcpStream::connect((credentials.host.as_str(), credentials.port))
            .await
            .map_err(|e| RemoteError::unreachable(format!("{}: {}", address, e)))?;

        let mut session = client::connect_stream(
            self.config.clone(),
            stream,
            SshHandler::new(&credentials.host, logger.clone()),
        )
        .await
        .map_err(|e| RemoteError::connection(format!("SSH handshake with {} failed: {}", address, e)))?;

        if let Err(e) = authenticate(&mut session, credentials, logger).await {
            let _ = session
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await;
            return Err(e);
        }

        Ok(session)
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SshTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Session = SshSession;

    async fn connect(
        &self,
        credentials: &Credentials,
        handshake_timeout: Duration,
        logger: &ClientLogger,
    ) -> Result<SshSession> {
        match timeout(handshake_timeout, self.handshake(credentials, logger)).await {
            Ok(Ok(handle)) => Ok(SshSession {
                handle,
                logger: logger.clone(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RemoteError::HandshakeTimeout(
                handshake_timeout.as_millis() as u64,
            )),
        }
    }
}

/// Authenticate with the SSH server
async fn authenticate(
    session: &mut Handle<SshHandler>,
    credentials: &Credentials,
    logger: &ClientLogger,
) -> Result<()> {
    // Try password authentication first
    if let Some(ref password) = credentials.password {
        logger.auth_attempt("password", &credentials.username);
        let auth_result = session
            .authenticate_password(&credentials.username, password)
            .await
            .map_err(|e| RemoteError::auth(e.to_string()))?;

        if auth_result.success() {
            logger.authenticated("password");
            return Ok(());
        } else {
            return Err(RemoteError::auth("Password authentication rejected"));
        }
    }

    if let Some(ref key_content) = credentials.private_key {
        logger.auth_attempt("publickey", &credentials.username);

        let key = russh::keys::PrivateKey::from_openssh(key_content.as_bytes())
            .map_err(|e| RemoteError::SshKey(format!("Failed to parse private key: {}", e)))?;

        // None picks the default hash for RSA and is ignored for other key types
        let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), None);

        let auth_result = session
            .authenticate_publickey(&credentials.username, key_with_alg)
            .await
            .map_err(|e| RemoteError::auth(e.to_string()))?;

        if auth_result.success() {
            logger.authenticated("publickey");
            return Ok(());
        } else {
            return Err(RemoteError::auth("Key authentication rejected"));
        }
    }

    Err(RemoteError::auth(
        "No authentication method available (require password or private_key)",
    ))
}

/// An authenticated russh session
pub struct SshSession {
    pub(crate) handle: Handle<SshHandler>,
    pub(crate) logger: ClientLogger,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<RawOutput> {
        self.exec_via_channel(command, stdin).await
    }

    async fn upload(&mut self, local: &std::path::Path, remote: &str) -> Result<()> {
        self.sftp_upload(local, remote).await
    }

    async fn download(&mut self, remote: &str, local: &std::path::Path) -> Result<()> {
        self.sftp_download(remote, local).await
    }

    async fn close(&mut self) {
        let _ = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await;
    }
}
