//! SSH connection, execution and transfer
//!
//! One session per operation: acquire, run, close.

pub mod command;
pub mod config;
pub mod connection;
pub mod elevation;
pub mod handler;
pub mod sanitize;
pub mod sftp;
pub mod transport;

// Re-exports
pub use config::Credentials;
pub use connection::{acquire, Connection, SshSession, SshTransport};
pub use elevation::{escape_for_shell, wrap_sudo_command, ElevatedCommand};
pub use handler::SshHandler;
pub use sanitize::sanitize_command;
pub use transport::{RawOutput, RemoteSession, Transport};
