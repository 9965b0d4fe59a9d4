//! Command validation for user-supplied input
//!
//! Applied to commands coming from the command line before they are sent.

use crate::error::{RemoteError, Result};

/// Sanitize a command before execution
///
/// Trims whitespace, rejects empty commands and enforces `max_chars`
/// (`None` = unlimited).
///
/// # Examples
/// ```
/// use linux_remote::ssh::sanitize::sanitize_command;
///
/// let cmd = sanitize_command("  df -h  ", Some(1000)).unwrap();
/// assert_eq!(cmd, "df -h");
///
/// let result = sanitize_command("a".repeat(100).as_str(), Some(50));
/// assert!(result.is_err());
/// ```
pub fn sanitize_command(command: &str, max_chars: Option<usize>) -> Result<String> {
    let trimmed = command.trim();

    if trimmed.is_empty() {
        return Err(RemoteError::invalid_params("Command cannot be empty"));
    }

    if let Some(max) = max_chars {
        let len = trimmed.chars().count();
        if len > max {
            return Err(RemoteError::invalid_params(format!(
                "Command is too long (max {} characters, got {})",
                max, len
            )));
        }
    }

    Ok(trimmed.to_string())
}
