//! Command execution over SSH
//!
//! [`Connection::execute`] runs one command (optionally through sudo) and
//! turns the raw channel output into a [`CommandResult`].

use std::time::Duration;

use russh::ChannelMsg;
use tokio::time::timeout;

use super::connection::{Connection, SshSession};
use super::elevation::{wrap_sudo_command, ElevatedCommand};
use super::transport::{RawOutput, RemoteSession};
use crate::error::{RemoteError, Result};
use crate::logger::ClientLogger;
use crate::response::CommandResult;

/// Exit code recorded when the channel closes without reporting a status
pub const MISSING_EXIT_STATUS: i32 = -1;

impl<S: RemoteSession> Connection<S> {
    /// Execute a command on this connection
    ///
    /// With `elevate`, the command is wrapped with sudo and the elevation
    /// secret is written to the remote stdin. `timeout_duration` bounds the
    /// whole round trip. A single call is exactly one attempt.
    ///
    /// # Returns
    /// * `Ok(CommandResult)` - Whatever the exit status; check `ok()`
    /// * `Err(RemoteError::Timeout)` - If the round trip times out
    /// * `Err(RemoteError::Connection)` - If channel setup fails
    pub async fn execute(
        &mut self,
        command: &str,
        elevate: bool,
        timeout_duration: Duration,
    ) -> Result<CommandResult> {
        let secret = self.elevation_secret.clone();
        let prepared = if elevate {
            wrap_sudo_command(command, secret.as_deref())
        } else {
            ElevatedCommand {
                command: command.to_string(),
                stdin: None,
            }
        };

        self.logger.dispatched(&prepared.command);

        let session = self.session_mut()?;
        let outcome = timeout(
            timeout_duration,
            session.exec(&prepared.command, prepared.stdin),
        )
        .await;

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                self.logger.command_failed(&prepared.command, &e);
                return Err(e);
            }
            Err(_) => {
                let e = RemoteError::Timeout(timeout_duration.as_millis() as u64);
                self.logger.command_failed(&prepared.command, &e);
                return Err(e);
            }
        };

        let result = into_result(raw, prepared.command);
        self.logger.completed(result.exited(), result.stdout());
        if let Some(stderr) = result.stderr() {
            self.logger.stderr(stderr);
        }

        Ok(result)
    }
}

/// Decode, trim and wrap raw channel output
fn into_result(raw: RawOutput, command: String) -> CommandResult {
    let exited = match raw.exit_status {
        Some(status) => status as i32,
        None => MISSING_EXIT_STATUS,
    };
    CommandResult::new(exited, normalize(&raw.stdout), normalize(&raw.stderr), command)
}

/// Lossy UTF-8 decode and trim; empty text becomes `None`
fn normalize(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl SshSession {
    /// Execute command via a new exec channel
    pub(crate) async fn exec_via_channel(
        &mut self,
        command: &str,
        stdin: Option<&str>,
    ) -> Result<RawOutput> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| RemoteError::connection(format!("Failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| RemoteError::connection(format!("Failed to exec command: {}", e)))?;

        if let Some(input) = stdin {
            // No EOF afterwards: the process reads the line and keeps its stdin
            channel
                .data(format!("{}\n", input).as_bytes())
                .await
                .map_err(|e| RemoteError::connection(format!("Failed to write stdin: {}", e)))?;
        }

        collect_channel_output(channel, &self.logger).await
    }
}

/// Collect output from a channel until it closes
///
/// EOF only ends the data streams; the exit status can arrive after it, so
/// collection continues until the channel itself is closed.
async fn collect_channel_output(
    mut channel: russh::Channel<russh::client::Msg>,
    logger: &ClientLogger,
) -> Result<RawOutput> {
    let mut output = RawOutput::default();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                output.stdout.extend_from_slice(&data);
            }
            ChannelMsg::ExtendedData { data, ext } => {
                // ext == 1 is stderr
                if ext == 1 {
                    output.stderr.extend_from_slice(&data);
                } else {
                    output.stdout.extend_from_slice(&data);
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                output.exit_status = Some(exit_status);
            }
            ChannelMsg::ExitSignal { signal_name, .. } => {
                logger.signalled(&signal_name);
            }
            ChannelMsg::Close => {
                break;
            }
            _ => {}
        }
    }

    logger.channel_finished(output.exit_status, output.stdout.len(), output.stderr.len());

    Ok(output)
}
