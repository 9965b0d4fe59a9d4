//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait to handle SSH connection events.

use crate::logger::ClientLogger;

/// SSH client handler for russh
///
/// Accepts every server key, the same policy as auto-adding unknown hosts.
/// The fingerprint is logged so it can be audited afterwards.
#[derive(Debug, Clone, Default)]
pub struct SshHandler {
    host: String,
    logger: ClientLogger,
}

impl SshHandler {
    /// Create a handler for connections to `host`
    pub fn new(host: impl Into<String>, logger: ClientLogger) -> Self {
        Self {
            host: host.into(),
            logger,
        }
    }
}

impl russh::client::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(Default::default());
        self.logger.host_key(&self.host, &fingerprint);
        Ok(true)
    }
}
