//! Privilege elevation for remote commands
//!
//! Commands are wrapped with `sudo ... sh -c '<command>'`. When a password is
//! available it is never placed on the command line: it is returned separately
//! so the executor can write it to the remote process's stdin, keeping it out
//! of process listings and shell history.

/// A command ready to be dispatched, plus what to feed its stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevatedCommand<'a> {
    /// The command line sent in the exec request
    pub command: String,

    /// Secret written to the remote stdin right after the exec request
    pub stdin: Option<&'a str>,
}

/// Wraps a command for execution with sudo privileges.
///
/// # Arguments
/// * `command` - The command to wrap with sudo
/// * `password` - Optional sudo password. If None, uses `sudo -n` (passwordless).
///   If Some, uses `sudo -S -p ''` and returns the password for stdin.
///
/// # Examples
///
/// ```
/// use linux_remote::ssh::elevation::wrap_sudo_command;
///
/// // Passwordless sudo
/// let elevated = wrap_sudo_command("apt update", None);
/// assert_eq!(elevated.command, "sudo -n -- sh -c 'apt update'");
/// assert_eq!(elevated.stdin, None);
///
/// // Sudo with password, delivered through stdin
/// let elevated = wrap_sudo_command("apt update", Some("mypassword"));
/// assert_eq!(elevated.command, "sudo -S -p '' -- sh -c 'apt update'");
/// assert_eq!(elevated.stdin, Some("mypassword"));
/// ```
pub fn wrap_sudo_command<'a>(command: &str, password: Option<&'a str>) -> ElevatedCommand<'a> {
    let escaped_command = escape_for_shell(command);

    match password {
        None => ElevatedCommand {
            // -n fails fast instead of waiting for a password that never comes
            command: format!("sudo -n -- sh -c '{}'", escaped_command),
            stdin: None,
        },
        Some(pwd) => ElevatedCommand {
            command: format!("sudo -S -p '' -- sh -c '{}'", escaped_command),
            stdin: Some(pwd),
        },
    }
}

/// Escapes a string for safe use in single-quoted shell contexts.
///
/// Replaces single quotes with the pattern `'"'"'` which ends the quoted
/// string, adds a double-quoted single quote and reopens the quoted string.
///
/// # Examples
///
/// ```
/// use linux_remote::ssh::elevation::escape_for_shell;
///
/// assert_eq!(escape_for_shell("hello"), "hello");
/// assert_eq!(escape_for_shell("it's"), "it'\"'\"'s");
/// ```
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}
