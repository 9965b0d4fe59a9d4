//! Remote Linux client
//!
//! [`LinuxClient`] ties the pieces together: every remote call acquires its
//! own connection, runs once, and closes the connection before returning,
//! whatever the outcome.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::{
    Config, CONNECTION_TIMEOUT_SECS, DEFAULT_LOCAL_TIMEOUT_SECS, DEFAULT_TIMEOUT_MS,
};
use crate::error::{RemoteError, Result};
use crate::local::LocalExecutor;
use crate::logger::ClientLogger;
use crate::response::CommandResult;
use crate::ssh::{acquire, Connection, Credentials, RemoteSession, SshTransport, Transport};

/// Timeouts and logging for a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on TCP connect + SSH handshake + authentication
    pub connect_timeout: Duration,

    /// Bound on one remote command round trip
    pub command_timeout: Duration,

    /// Bound on one local command
    pub local_timeout: Duration,

    /// Whether the client emits log events
    pub logging: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            command_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            local_timeout: Duration::from_secs(DEFAULT_LOCAL_TIMEOUT_SECS),
            logging: true,
        }
    }
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            command_timeout: Duration::from_millis(config.timeout_ms),
            local_timeout: Duration::from_secs(config.local_timeout_secs),
            logging: !config.quiet,
        }
    }
}

/// Client for one remote Linux host
///
/// Holds no connection between calls, so it can be shared across tasks;
/// concurrent calls simply open concurrent connections.
pub struct LinuxClient<T: Transport = SshTransport> {
    credentials: Credentials,
    transport: T,
    options: ClientOptions,
    logger: ClientLogger,
    local: LocalExecutor,
}

impl LinuxClient<SshTransport> {
    /// Create a client using the russh transport and default options
    pub fn new(credentials: Credentials) -> Self {
        Self::with_transport(credentials, SshTransport::new())
    }

    /// Create a client from validated CLI configuration
    pub fn from_config(config: &Config, credentials: Credentials) -> Self {
        Self::new(credentials).with_options(ClientOptions::from(config))
    }
}

impl<T: Transport> LinuxClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        let options = ClientOptions::default();
        let logger = ClientLogger::new(&credentials.host, options.logging);
        Self {
            local: LocalExecutor::new(logger.clone()),
            credentials,
            transport,
            options,
            logger,
        }
    }

    /// Replace all options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.logger = ClientLogger::new(&self.credentials.host, options.logging);
        self.local = LocalExecutor::new(self.logger.clone());
        self.options = options;
        self
    }

    /// Set the handshake timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Set the default remote command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Set the local command timeout
    pub fn with_local_timeout(mut self, timeout: Duration) -> Self {
        self.options.local_timeout = timeout;
        self
    }

    /// Turn log events on or off
    pub fn with_logging(self, enabled: bool) -> Self {
        let options = ClientOptions {
            logging: enabled,
            ..self.options.clone()
        };
        self.with_options(options)
    }

    /// Credentials this client connects with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Logging handle shared by this client's operations
    pub fn logger(&self) -> &ClientLogger {
        &self.logger
    }

    /// Open an authenticated connection
    ///
    /// The caller owns the returned connection and must `close` it.
    pub async fn connect(&self) -> Result<Connection<T::Session>> {
        acquire(
            &self.transport,
            &self.credentials,
            self.options.connect_timeout,
            &self.logger,
        )
        .await
    }

    /// Execute a command on the remote host with the default timeout
    pub async fn run_cmd(&self, cmd: &str, sudo: bool) -> Result<CommandResult> {
        self.run_cmd_with_timeout(cmd, sudo, self.options.command_timeout)
            .await
    }

    /// Execute a command on the remote host
    ///
    /// Opens a connection, runs the command once (through sudo if `sudo`),
    /// and closes the connection on every path.
    pub async fn run_cmd_with_timeout(
        &self,
        cmd: &str,
        sudo: bool,
        timeout_duration: Duration,
    ) -> Result<CommandResult> {
        let mut conn = self.connect().await?;
        let result = conn.execute(cmd, sudo, timeout_duration).await;
        conn.close().await;
        result
    }

    /// Run a command on the local machine and return its combined output
    pub async fn run_cmd_local(&self, cmd: &str) -> Result<String> {
        self.local.run(cmd, self.options.local_timeout).await
    }

    /// Run a local command with an explicit timeout
    pub async fn run_cmd_local_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<String> {
        self.local.run(cmd, timeout_duration).await
    }

    /// Upload a local file and confirm it exists remotely afterwards
    ///
    /// `true` only means the destination exists; contents are not verified.
    pub async fn upload(&self, local: impl AsRef<Path>, remote: &str) -> Result<bool> {
        let local = local.as_ref();
        let mut conn = self.connect().await?;
        let transferred = match conn.session_mut() {
            Ok(session) => session.upload(local, remote).await,
            Err(e) => Err(e),
        };
        conn.close().await;
        transferred?;

        self.logger
            .transferred("uploaded", &local.display().to_string(), remote);
        self.remote_exists(remote).await
    }

    /// Download a remote file and confirm it exists locally afterwards
    ///
    /// `true` only means the destination exists; contents are not verified.
    pub async fn download(&self, remote: &str, local: impl AsRef<Path>) -> Result<bool> {
        let local = local.as_ref();
        let mut conn = self.connect().await?;
        let transferred = match conn.session_mut() {
            Ok(session) => session.download(remote, local).await,
            Err(e) => Err(e),
        };
        conn.close().await;
        transferred?;

        self.logger
            .transferred("downloaded", remote, &local.display().to_string());
        Ok(tokio::fs::try_exists(local).await?)
    }

    /// `test -e` on the remote host
    pub(crate) async fn remote_exists(&self, path: &str) -> Result<bool> {
        Ok(self.run_cmd(&format!("test -e {}", path), false).await?.ok())
    }

    /// Check the host accepts TCP connections on `port` (the SSH port if `None`)
    pub async fn is_host_available(&self, port: Option<u16>, probe_timeout: Duration) -> bool {
        let port = port.unwrap_or(self.credentials.port);
        matches!(
            timeout(
                probe_timeout,
                TcpStream::connect((self.credentials.host.as_str(), port))
            )
            .await,
            Ok(Ok(_))
        )
    }

    /// Check the credentials by running `whoami`
    ///
    /// Rejected credentials give `Ok(false)`; any other failure is returned.
    pub async fn is_credentials_valid(&self) -> Result<bool> {
        match self.run_cmd("whoami", false).await {
            Ok(_) => Ok(true),
            Err(RemoteError::Authentication(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Name of the operating system this client runs on
    pub fn get_current_os_name() -> &'static str {
        std::env::consts::OS
    }
}

impl<T: Transport> fmt::Display for LinuxClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Local host: {}", Self::get_current_os_name())?;
        writeln!(f, "Remote host: {}", self.credentials.address())?;
        write!(f, "Username: {}", self.credentials.username)
    }
}

impl<T: Transport> fmt::Debug for LinuxClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinuxClient")
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::logger::capture::Recorder;
    use crate::ssh::transport::mock::{ConnectFailure, MockTransport};

    pub(crate) fn client(transport: &MockTransport) -> LinuxClient<MockTransport> {
        let creds = Credentials::new("10.0.0.5", "admin").with_password("s3cret");
        LinuxClient::with_transport(creds, transport.clone()).with_logging(false)
    }

    #[tokio::test]
    async fn test_run_cmd_opens_and_closes_one_connection() {
        let transport = MockTransport::replying(0, "mypc\n", "");
        let result = client(&transport).run_cmd("hostname", false).await.unwrap();

        assert!(result.ok());
        assert_eq!(result.stdout(), Some("mypc"));
        assert_eq!(transport.state.connects.load(Ordering::SeqCst), 1);
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_released_on_exec_error_and_timeout() {
        let failing = MockTransport {
            fail_exec: true,
            ..MockTransport::default()
        };
        let err = client(&failing).run_cmd("whoami", false).await.unwrap_err();
        assert!(matches!(err, RemoteError::Connection(_)));
        assert_eq!(failing.state.closes.load(Ordering::SeqCst), 1);

        let slow = MockTransport {
            exec_delay: Some(Duration::from_secs(5)),
            ..MockTransport::default()
        };
        let err = client(&slow)
            .run_cmd_with_timeout("sleep 5", false, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(20)));
        assert_eq!(slow.state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_call_gets_its_own_connection() {
        let transport = MockTransport::replying(0, "ok", "");
        let client = client(&transport);

        let (a, b, c) = tokio::join!(
            client.run_cmd("date", false),
            client.run_cmd("uptime", false),
            client.run_cmd("hostname", true),
        );
        assert!(a.unwrap().ok() && b.unwrap().ok() && c.unwrap().ok());

        assert_eq!(transport.state.connects.load(Ordering::SeqCst), 3);
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sudo_uses_stdin_secret() {
        let transport = MockTransport::replying(0, "", "");
        client(&transport)
            .run_cmd("systemctl stop nginx", true)
            .await
            .unwrap();

        let execs = transport.state.execs.lock().unwrap().clone();
        assert_eq!(
            execs,
            vec![(
                "sudo -S -p '' -- sh -c 'systemctl stop nginx'".to_string(),
                Some("s3cret".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_credentials_validity() {
        let good = MockTransport::replying(0, "admin", "");
        assert!(client(&good).is_credentials_valid().await.unwrap());

        let rejected = MockTransport {
            connect_failure: Some(ConnectFailure::Auth),
            ..MockTransport::default()
        };
        assert!(!client(&rejected).is_credentials_valid().await.unwrap());

        let unreachable = MockTransport {
            connect_failure: Some(ConnectFailure::Unreachable),
            ..MockTransport::default()
        };
        let err = client(&unreachable).is_credentials_valid().await.unwrap_err();
        assert!(matches!(err, RemoteError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_upload_checks_remote_existence() {
        let transport = MockTransport::replying(0, "", "");
        let uploaded = client(&transport)
            .upload("/tmp/report.pdf", "/home/admin/report.pdf")
            .await
            .unwrap();

        assert!(uploaded);
        assert_eq!(
            transport.state.uploads.lock().unwrap().clone(),
            vec![("/tmp/report.pdf".to_string(), "/home/admin/report.pdf".to_string())]
        );
        assert_eq!(transport.state.last_command(), "test -e /home/admin/report.pdf");
        // transfer connection + existence check connection
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_upload_reports_missing_destination() {
        let transport = MockTransport::replying(1, "", "");
        let uploaded = client(&transport)
            .upload("/tmp/report.pdf", "/readonly/report.pdf")
            .await
            .unwrap();
        assert!(!uploaded);
    }

    #[tokio::test]
    async fn test_failed_transfer_still_closes() {
        let transport = MockTransport {
            fail_transfer: true,
            ..MockTransport::default()
        };
        let err = client(&transport)
            .upload("/tmp/missing", "/tmp/dest")
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteError::Transfer(_)));
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 1);
        assert!(transport.state.commands().is_empty());
    }

    #[tokio::test]
    async fn test_download_checks_local_existence() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("syslog");
        let transport = MockTransport::default();

        let downloaded = client(&transport)
            .download("/var/log/syslog", &local)
            .await
            .unwrap();

        assert!(downloaded);
        assert!(local.exists());
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 1);
        assert!(transport.state.commands().is_empty());
    }

    #[tokio::test]
    async fn test_is_host_available() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let creds = Credentials::new("127.0.0.1", "admin").with_port(port);
        let client = LinuxClient::with_transport(creds, MockTransport::default());

        assert!(client.is_host_available(None, Duration::from_secs(1)).await);
        drop(listener);
        assert!(!client.is_host_available(Some(1), Duration::from_secs(1)).await);
    }

    #[test]
    fn test_display_hides_password() {
        let transport = MockTransport::default();
        let rendered = client(&transport).to_string();
        assert!(rendered.contains("10.0.0.5:22"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_with_logging_toggles_logger() {
        let transport = MockTransport::default();
        let quiet = client(&transport);
        assert!(!quiet.logger().is_enabled());
        assert!(!quiet.options().logging);
        assert!(quiet.with_logging(true).logger().is_enabled());
    }

    #[tokio::test]
    async fn test_cancelled_call_releases_session_once() {
        let (recorder, _guard) = Recorder::install();
        let transport = MockTransport {
            exec_delay: Some(Duration::from_secs(5)),
            ..MockTransport::default()
        };
        let client = client(&transport).with_logging(true);

        let cancelled = timeout(Duration::from_millis(10), client.run_cmd("sleep 5", false)).await;
        assert!(cancelled.is_err());

        assert_eq!(transport.state.connects.load(Ordering::SeqCst), 1);
        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 0);
        assert_eq!(transport.state.drop_releases.load(Ordering::SeqCst), 1);
        assert_eq!(transport.state.releases(), 1);
        assert!(recorder
            .events()
            .iter()
            .any(|e| e == "connection dropped without close, releasing session"));
    }

    #[tokio::test]
    async fn test_completed_calls_release_through_close_only() {
        let transport = MockTransport::replying(0, "ok", "");
        let client = client(&transport);
        client.run_cmd("true", true).await.unwrap();
        client.run_cmd("true", false).await.unwrap();

        assert_eq!(transport.state.closes.load(Ordering::SeqCst), 2);
        assert_eq!(transport.state.drop_releases.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logging_disabled_client_emits_nothing() {
        let (recorder, _guard) = Recorder::install();
        let transport = MockTransport::replying(1, "out", "boom");
        let client = client(&transport);

        let result = client.run_cmd("false", true).await.unwrap();
        assert!(!result.ok());
        let _ = client
            .run_cmd_with_timeout("sleep 5", false, Duration::from_millis(1))
            .await;
        #[cfg(unix)]
        client.run_cmd_local("echo hi").await.unwrap();

        assert_eq!(recorder.span_count(), 0);
        assert!(recorder.events().is_empty(), "{:?}", recorder.events());
    }
}
