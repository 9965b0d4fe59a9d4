//! linux-remote - administrative commands on remote Linux hosts over SSH
//!
//! Every remote call opens its own SSH connection, runs one command and
//! closes the connection again, returning a [`CommandResult`] with the exit
//! status, trimmed stdout and stderr, and the command as it was sent.
//!
//! # Features
//!
//! - Remote execution with optional `sudo` elevation; the sudo password is
//!   piped to stdin, never placed on the command line
//! - Connection failures classified as authentication, unreachable host or
//!   handshake timeout
//! - Local execution with a timeout that returns partial output
//! - SFTP upload/download with an existence check afterwards
//! - Wrappers for common service, file and system commands
//!
//! # Example
//!
//! ```no_run
//! use linux_remote::{Credentials, LinuxClient};
//!
//! # async fn demo() -> linux_remote::Result<()> {
//! let client = LinuxClient::new(Credentials::new("192.168.1.100", "admin").with_password("secret"));
//!
//! let status = client.get_service_status("nginx").await?;
//! if !status.ok() {
//!     client.restart_service("nginx").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod local;
pub mod logger;
pub mod response;
pub mod ssh;

// Re-exports for convenience
pub use client::{ClientOptions, LinuxClient};
pub use commands::Archive;
pub use config::{Action, Args, Config};
pub use error::{RemoteError, Result};
pub use local::LocalExecutor;
pub use logger::ClientLogger;
pub use response::CommandResult;
pub use ssh::{
    escape_for_shell, sanitize_command, wrap_sudo_command, Connection, Credentials, SshTransport,
    Transport,
};
