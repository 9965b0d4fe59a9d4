//! Configuration and CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{RemoteError, Result};
use crate::ssh::Credentials;

/// Default timeout for remote command execution in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for local command execution in seconds
pub const DEFAULT_LOCAL_TIMEOUT_SECS: u64 = 60;

/// Default max characters for a command (None = unlimited)
pub const DEFAULT_MAX_CHARS: Option<usize> = Some(1000);

/// Connection (handshake) timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 15;

/// CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "linux-remote")]
#[command(version)]
#[command(about = "Run administrative commands on a remote Linux host over SSH")]
pub struct Args {
    /// SSH host to connect to
    #[arg(long, env = "LINUX_REMOTE_HOST", global = true)]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, default_value = "22", env = "LINUX_REMOTE_PORT", global = true)]
    pub port: u16,

    /// SSH username
    #[arg(long, env = "LINUX_REMOTE_USER", global = true)]
    pub user: Option<String>,

    /// SSH password (alternative to key)
    #[arg(long, env = "LINUX_REMOTE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Path to SSH private key file (alternative to password)
    #[arg(long, env = "LINUX_REMOTE_KEY", global = true)]
    pub key: Option<PathBuf>,

    /// Password for `sudo` (defaults to the login password)
    #[arg(long, env = "LINUX_REMOTE_SUDO_PASSWORD", global = true, hide_env_values = true)]
    pub sudo_password: Option<String>,

    /// Remote command timeout in milliseconds
    #[arg(long, default_value = "30000", env = "LINUX_REMOTE_TIMEOUT", global = true)]
    pub timeout: u64,

    /// SSH handshake timeout in seconds
    #[arg(long, default_value = "15", env = "LINUX_REMOTE_CONNECT_TIMEOUT", global = true)]
    pub connect_timeout: u64,

    /// Local command timeout in seconds
    #[arg(long, default_value = "60", env = "LINUX_REMOTE_LOCAL_TIMEOUT", global = true)]
    pub local_timeout: u64,

    /// Maximum characters for command length.
    /// Use "none", "0", or negative value to disable limit.
    /// Default: 1000
    #[arg(long = "maxChars", env = "LINUX_REMOTE_MAX_CHARS", global = true)]
    pub max_chars: Option<String>,

    /// Only log warnings and errors, and silence per-command logging
    #[arg(long, short, default_value = "false", env = "LINUX_REMOTE_QUIET", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub action: Action,
}

/// What to do
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Execute a shell command on the remote host
    Exec { command: String },

    /// Execute a shell command on the remote host through sudo
    SudoExec { command: String },

    /// Execute a shell command on this machine
    Local { command: String },

    /// Upload a local file to the remote host
    Upload { local: PathBuf, remote: String },

    /// Download a remote file to this machine
    Download { remote: String, local: PathBuf },

    /// Check the host is reachable and the credentials are accepted
    Check,
}

impl Action {
    /// Whether the action talks to the remote host
    pub fn is_remote(&self) -> bool {
        !matches!(self, Action::Local { .. })
    }
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SSH host
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// SSH password
    pub password: Option<String>,

    /// Path to SSH private key
    pub key: Option<PathBuf>,

    /// Password for sudo commands
    pub sudo_password: Option<String>,

    /// Remote command timeout in milliseconds
    pub timeout_ms: u64,

    /// Handshake timeout in seconds
    pub connect_timeout_secs: u64,

    /// Local command timeout in seconds
    pub local_timeout_secs: u64,

    /// Maximum command length (None = unlimited)
    pub max_chars: Option<usize>,

    /// Whether client logging is silenced
    pub quiet: bool,

    /// Requested action
    pub action: Action,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        validate_args(&args)?;

        let max_chars = parse_max_chars(args.max_chars.as_deref());

        Ok(Config {
            host: args.host.unwrap_or_default(),
            port: args.port,
            user: args.user.unwrap_or_default(),
            password: sanitize_password(args.password),
            key: args.key,
            sudo_password: sanitize_password(args.sudo_password),
            timeout_ms: args.timeout,
            connect_timeout_secs: args.connect_timeout,
            local_timeout_secs: args.local_timeout,
            max_chars,
            quiet: args.quiet,
            action: args.action,
        })
    }

    /// Build credentials, reading the private key file if one is configured
    pub async fn credentials(&self) -> Result<Credentials> {
        let mut credentials = Credentials::new(&self.host, &self.user).with_port(self.port);

        if let Some(ref password) = self.password {
            credentials = credentials.with_password(password);
        }

        if let Some(ref key_path) = self.key {
            let key_content = tokio::fs::read_to_string(key_path)
                .await
                .map_err(RemoteError::Io)?;
            credentials = credentials.with_private_key(key_content);
        }

        if let Some(ref sudo_password) = self.sudo_password {
            credentials = credentials.with_sudo_password(sudo_password);
        }

        Ok(credentials)
    }
}

/// Validate CLI arguments
fn validate_args(args: &Args) -> Result<()> {
    if !args.action.is_remote() {
        return Ok(());
    }

    let mut errors = Vec::new();

    if args.host.as_deref().unwrap_or_default().is_empty() {
        errors.push("Missing required --host".to_string());
    }

    if args.user.as_deref().unwrap_or_default().is_empty() {
        errors.push("Missing required --user".to_string());
    }

    let has_password = args.password.as_deref().is_some_and(|p| !p.is_empty());
    if !has_password && args.key.is_none() {
        errors.push("Must provide either --password or --key".to_string());
    }

    if let Some(ref key_path) = args.key {
        if !key_path.exists() {
            errors.push(format!("SSH key file not found: {}", key_path.display()));
        }
    }

    if !errors.is_empty() {
        return Err(RemoteError::Config(format!(
            "Configuration error:\n{}",
            errors.join("\n")
        )));
    }

    Ok(())
}

/// Parse max_chars argument
///
/// - "none" (case-insensitive) → None (unlimited)
/// - "0" or negative → None (unlimited)
/// - positive integer → Some(value)
/// - None (not provided) or unparsable → DEFAULT_MAX_CHARS
pub fn parse_max_chars(value: Option<&str>) -> Option<usize> {
    match value {
        None => DEFAULT_MAX_CHARS,
        Some(s) => {
            if s.eq_ignore_ascii_case("none") {
                return None;
            }

            match s.parse::<i64>() {
                Ok(n) if n <= 0 => None,
                Ok(n) => Some(n as usize),
                Err(_) => DEFAULT_MAX_CHARS,
            }
        }
    }
}

/// Sanitize password: return None if empty
fn sanitize_password(password: Option<String>) -> Option<String> {
    password.filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv.iter().copied()).unwrap()
    }

    #[test]
    fn test_parse_max_chars() {
        assert_eq!(parse_max_chars(Some("none")), None);
        assert_eq!(parse_max_chars(Some("NONE")), None);
        assert_eq!(parse_max_chars(Some("0")), None);
        assert_eq!(parse_max_chars(Some("-100")), None);
        assert_eq!(parse_max_chars(Some("500")), Some(500));
        assert_eq!(parse_max_chars(Some("abc")), DEFAULT_MAX_CHARS);
        assert_eq!(parse_max_chars(None), DEFAULT_MAX_CHARS);
    }

    #[test]
    fn test_sanitize_password() {
        assert_eq!(
            sanitize_password(Some("secret".to_string())),
            Some("secret".to_string())
        );
        assert_eq!(sanitize_password(Some("".to_string())), None);
        assert_eq!(sanitize_password(None), None);
    }

    #[test]
    fn test_remote_action_config() {
        let args = parse(&[
            "linux-remote",
            "--host=10.0.0.5",
            "--user=admin",
            "--password=secret",
            "--timeout=5000",
            "sudo-exec",
            "systemctl restart nginx",
        ]);
        let config = Config::from_args(args).unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.connect_timeout_secs, CONNECTION_TIMEOUT_SECS);
        assert_eq!(config.max_chars, DEFAULT_MAX_CHARS);
        assert_eq!(
            config.action,
            Action::SudoExec {
                command: "systemctl restart nginx".to_string()
            }
        );
    }

    #[test]
    fn test_flags_accepted_after_subcommand() {
        let args = parse(&["linux-remote", "check", "--host", "h", "--user", "u", "--password", "p"]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.host, "h");
        assert_eq!(config.action, Action::Check);
    }

    #[test]
    fn test_missing_remote_settings_reported_together() {
        let args = parse(&["linux-remote", "exec", "uptime"]);
        let err = Config::from_args(args).unwrap_err().to_string();

        assert!(err.contains("--host"));
        assert!(err.contains("--user"));
        assert!(err.contains("--password or --key"));
    }

    #[test]
    fn test_empty_password_is_missing() {
        let args = parse(&["linux-remote", "--host=h", "--user=u", "--password=", "check"]);
        assert!(Config::from_args(args).is_err());
    }

    #[test]
    fn test_missing_key_file() {
        let args = parse(&[
            "linux-remote",
            "--host=h",
            "--user=u",
            "--key=/definitely/not/here/id_ed25519",
            "check",
        ]);
        let err = Config::from_args(args).unwrap_err().to_string();
        assert!(err.contains("SSH key file not found"));
    }

    #[test]
    fn test_local_action_needs_no_host() {
        let args = parse(&["linux-remote", "local", "uname -a"]);
        let config = Config::from_args(args).unwrap();
        assert!(!config.action.is_remote());
        assert!(config.host.is_empty());
    }

    #[tokio::test]
    async fn test_credentials_from_config() {
        let args = parse(&[
            "linux-remote",
            "--host=10.0.0.5",
            "--port=2222",
            "--user=admin",
            "--password=secret",
            "--sudo-password=rootpw",
            "check",
        ]);
        let creds = Config::from_args(args).unwrap().credentials().await.unwrap();

        assert_eq!(creds.address(), "10.0.0.5:2222");
        assert_eq!(creds.password.as_deref(), Some("secret"));
        assert_eq!(creds.elevation_secret(), Some("rootpw"));
    }
}
