//! Local command execution using `tokio::process`
//!
//! Returns decoded text only. A command that outlives its timeout is killed
//! and whatever it printed so far is returned instead of an error.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};

use crate::error::Result;
use crate::logger::ClientLogger;

/// How long to keep draining pipes after a timed-out process was killed
const DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Local command executor
///
/// Runs commands through the platform shell on the machine hosting the client.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    logger: ClientLogger,
}

impl LocalExecutor {
    /// Create a local executor reporting through `logger`
    #[must_use]
    pub fn new(logger: ClientLogger) -> Self {
        Self { logger }
    }

    /// Run `cmd` through the shell and return stdout followed by stderr
    ///
    /// On normal completion the text is trimmed. On timeout the process is
    /// killed and the output produced so far is returned untrimmed.
    /// Only a failure to spawn the shell is an error.
    pub async fn run(&self, cmd: &str, timeout_duration: Duration) -> Result<String> {
        self.logger.dispatched(cmd);

        let mut child = shell(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, Stream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, Stream::Stderr, tx));
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let deadline = Instant::now() + timeout_duration;

        let finished = timeout_at(deadline, async {
            while let Some((stream, chunk)) = rx.recv().await {
                match stream {
                    Stream::Stdout => stdout.extend_from_slice(&chunk),
                    Stream::Stderr => stderr.extend_from_slice(&chunk),
                }
            }
            child.wait().await
        })
        .await;

        match finished {
            Ok(status) => {
                let code = status.ok().and_then(|s| s.code()).unwrap_or(-1);
                self.logger.local_finished(cmd, code);
                stdout.extend_from_slice(&stderr);
                let data = String::from_utf8_lossy(&stdout).trim().to_string();
                self.logger.completed(code, Some(&data));
                Ok(data)
            }
            Err(_) => {
                self.logger.local_timed_out(cmd, timeout_duration);
                let _ = child.kill().await;

                // Children of the shell may still hold the pipes open; take
                // what arrives within the grace period and stop there.
                while let Ok(Some((stream, chunk))) = timeout(DRAIN_GRACE, rx.recv()).await {
                    match stream {
                        Stream::Stdout => stdout.extend_from_slice(&chunk),
                        Stream::Stderr => stderr.extend_from_slice(&chunk),
                    }
                }

                stdout.extend_from_slice(&stderr);
                Ok(String::from_utf8_lossy(&stdout).into_owned())
            }
        }
    }
}

#[cfg(not(windows))]
fn shell(cmd: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(cmd);
    command
}

#[cfg(windows)]
fn shell(cmd: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(cmd);
    command
}

/// Forward everything read from `reader` to `tx` until EOF
async fn pump<R>(mut reader: R, stream: Stream, tx: mpsc::UnboundedSender<(Stream, Vec<u8>)>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send((stream, buf[..n].to_vec())).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> LocalExecutor {
        LocalExecutor::new(ClientLogger::disabled())
    }

    #[tokio::test]
    async fn test_run_success() {
        let out = executor()
            .run("echo hello", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_run_combines_stdout_then_stderr() {
        let out = executor()
            .run("echo error >&2; echo output", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "output\nerror");
    }

    #[tokio::test]
    async fn test_run_failure_still_returns_text() {
        let out = executor()
            .run("echo nope >&2; exit 3", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "nope");
    }

    #[tokio::test]
    async fn test_run_timeout_returns_partial_output() {
        let started = std::time::Instant::now();
        let out = executor()
            .run("echo partial; sleep 5; echo never", Duration::from_millis(300))
            .await
            .unwrap();

        assert!(out.contains("partial"));
        assert!(!out.contains("never"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_run_timeout_without_output() {
        let out = executor()
            .run("sleep 5", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_logger_records_nothing() {
        let (recorder, _guard) = crate::logger::capture::Recorder::install();

        executor().run("echo hi", Duration::from_secs(5)).await.unwrap();
        executor().run("sleep 5", Duration::from_millis(50)).await.unwrap();

        assert_eq!(recorder.span_count(), 0);
        assert!(recorder.events().is_empty(), "{:?}", recorder.events());
    }
}
