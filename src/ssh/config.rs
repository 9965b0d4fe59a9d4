//! SSH credentials
//!
//! Connection parameters including authentication secrets.

use std::fmt;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Credentials for one remote host
///
/// Fixed for the lifetime of a client. `Debug` never prints secrets.
#[derive(Clone)]
pub struct Credentials {
    /// Remote hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Password for password authentication
    pub password: Option<String>,

    /// Private key content (not path!) for key authentication
    pub private_key: Option<String>,

    /// Password for `sudo` commands (if different from the login password)
    pub sudo_password: Option<String>,
}

impl Credentials {
    /// Create credentials with minimal required fields
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: None,
            private_key: None,
            sudo_password: None,
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set password authentication
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set private key authentication (key content, not path)
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Set sudo password for elevated commands
    pub fn with_sudo_password(mut self, password: impl Into<String>) -> Self {
        self.sudo_password = Some(password.into());
        self
    }

    /// Secret piped to `sudo -S`: the sudo password, else the login password
    pub fn elevation_secret(&self) -> Option<&str> {
        self.sudo_password.as_deref().or(self.password.as_deref())
    }

    /// `host:port` for logs and socket addresses
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .field("sudo_password", &self.sudo_password.as_ref().map(|_| "***"))
            .finish()
    }
}
