//! SFTP file transfer
//!
//! Each transfer opens the `sftp` subsystem on a new channel of the session.
//! The remote sshd must have an SFTP subsystem configured.

use std::path::Path;

use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::connection::SshSession;
use crate::error::{RemoteError, Result};

impl SshSession {
    async fn open_sftp(&self) -> Result<SftpSession> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| RemoteError::connection(format!("Failed to open channel: {}", e)))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| RemoteError::transfer(format!("Failed to request SFTP subsystem: {}", e)))?;
        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| RemoteError::transfer(format!("Failed to start SFTP session: {}", e)))
    }

    /// Upload a local file to `remote`, replacing it if present
    pub(crate) async fn sftp_upload(&self, local: &Path, remote: &str) -> Result<()> {
        let contents = tokio::fs::read(local).await?;
        let sftp = self.open_sftp().await?;

        let mut file = sftp
            .open_with_flags(
                remote,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .map_err(|e| RemoteError::transfer(format!("{}: {}", remote, e)))?;
        file.write_all(&contents).await?;
        file.flush().await?;
        file.shutdown().await?;

        let _ = sftp.close().await;
        self.logger.transfer_bytes("upload", contents.len(), remote);
        Ok(())
    }

    /// Download `remote` into a local file, replacing it if present
    pub(crate) async fn sftp_download(&self, remote: &str, local: &Path) -> Result<()> {
        let sftp = self.open_sftp().await?;

        let mut file = sftp
            .open_with_flags(remote, OpenFlags::READ)
            .await
            .map_err(|e| RemoteError::transfer(format!("{}: {}", remote, e)))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        let _ = sftp.close().await;
        tokio::fs::write(local, &contents).await?;
        self.logger.transfer_bytes("download", contents.len(), remote);
        Ok(())
    }
}
