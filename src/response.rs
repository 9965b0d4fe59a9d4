//! Structured view over a finished remote command

use serde::Serialize;

/// Result of a remote command execution.
///
/// A passive view: the accessors return exactly what the executor recorded.
/// A non-zero exit status is data, not an error; check [`CommandResult::ok`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    exited: i32,
    stdout: Option<String>,
    stderr: Option<String>,
    command: String,
}

impl CommandResult {
    pub(crate) fn new(
        exited: i32,
        stdout: Option<String>,
        stderr: Option<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            exited,
            stdout,
            stderr,
            command: command.into(),
        }
    }

    /// Trimmed stdout, `None` when the command printed nothing
    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    /// Trimmed stderr, `None` when the command printed nothing
    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    /// Exit status reported by the remote channel (`-1` if none was sent)
    pub fn exited(&self) -> i32 {
        self.exited
    }

    /// `true` iff the exit status is 0
    pub fn ok(&self) -> bool {
        self.exited == 0
    }

    /// The command exactly as dispatched, including any sudo wrapping
    pub fn command(&self) -> &str {
        &self.command
    }
}
