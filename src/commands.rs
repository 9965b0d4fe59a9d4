//! Administrative command wrappers
//!
//! Each wrapper formats one shell command and runs it through
//! [`LinuxClient::run_cmd`]. Arguments are pasted into the command line as
//! shell words, so paths may contain globs; quoting is up to the caller.

use std::path::Path;

use serde_json::Value;

use crate::client::LinuxClient;
use crate::error::{RemoteError, Result};
use crate::response::CommandResult;
use crate::ssh::Transport;

/// Archive formats understood by [`LinuxClient::extract_files`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Archive {
    /// `<src>.tar.gz`, extracted with `tar -xzvf`
    #[default]
    Tar,
    /// `.zip`, extracted with `unzip`
    Zip,
}

impl<T: Transport> LinuxClient<T> {
    // ---------- System ----------

    pub async fn get_os_version(&self) -> Result<CommandResult> {
        self.run_cmd("lsb_release -a", false).await
    }

    pub async fn get_ip(&self) -> Result<CommandResult> {
        self.run_cmd("hostname -I", false).await
    }

    pub async fn get_hostname(&self) -> Result<CommandResult> {
        self.run_cmd("hostname", false).await
    }

    /// Set the hostname and point the `127.0.1.1` hosts entry at it
    pub async fn change_hostname(&self, name: &str) -> Result<CommandResult> {
        let set = self
            .run_cmd(
                &format!("echo {name} > /etc/hostname; hostname -F /etc/hostname"),
                true,
            )
            .await?;
        if !set.ok() {
            return Ok(set);
        }
        self.run_cmd(
            &format!(r#"sed -i "/127.0.1.1.*/d" /etc/hosts; echo "127.0.1.1 {name}" >> /etc/hosts"#),
            true,
        )
        .await
    }

    pub async fn get_date(&self) -> Result<CommandResult> {
        self.run_cmd("date", false).await
    }

    pub async fn get_processes(&self) -> Result<CommandResult> {
        self.run_cmd("ps -aux", false).await
    }

    /// `netstat`, with `params` appended as flags (e.g. `"ltpu"`)
    ///
    /// Needs net-tools on the remote host.
    pub async fn get_netstat_info(&self, params: &str) -> Result<CommandResult> {
        let cmd = if params.is_empty() {
            "netstat".to_string()
        } else {
            format!("netstat -{params}")
        };
        self.run_cmd(&cmd, false).await
    }

    pub async fn reboot(&self) -> Result<CommandResult> {
        self.run_cmd("shutdown -r now", true).await
    }

    pub async fn shutdown(&self) -> Result<CommandResult> {
        self.run_cmd("shutdown -h now", true).await
    }

    /// Change the login user's password with `chpasswd`
    ///
    /// Later calls keep using the old password from the credentials.
    pub async fn change_password(&self, new_password: &str) -> Result<CommandResult> {
        let username = &self.credentials().username;
        self.run_cmd(&format!("echo {username}:{new_password} | chpasswd"), true)
            .await
    }

    pub async fn get_disk_usage(&self) -> Result<CommandResult> {
        self.run_cmd("df -h", false).await
    }

    /// Use% of the root filesystem, for example `42%`
    ///
    /// Only the fifth `df` column is returned, not the whole `df` line.
    pub async fn get_free_space(&self) -> Result<CommandResult> {
        self.run_cmd("df -h / | tail -n1 | awk '{print $5}'", false)
            .await
    }

    // ---------- Services ----------

    /// Full `systemctl status` output
    pub async fn get_service(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl status {name}"), false)
            .await
    }

    pub async fn get_service_status(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl is-active {name}"), false)
            .await
    }

    pub async fn start_service(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl start {name}"), true).await
    }

    pub async fn stop_service(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl stop {name}"), true).await
    }

    pub async fn kill_service(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl kill {name}"), true).await
    }

    pub async fn restart_service(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl restart {name}"), true)
            .await
    }

    pub async fn get_service_journal(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("journalctl -u {name}"), true).await
    }

    /// List service units; `all_services` includes loaded but inactive ones
    pub async fn list_active_services(
        &self,
        no_legend: bool,
        all_services: bool,
    ) -> Result<CommandResult> {
        let mut cmd = String::from("systemctl list-units -t service");
        if no_legend {
            cmd.push_str(" --no-legend");
        }
        if all_services {
            cmd.push_str(" --all");
        }
        self.run_cmd(&cmd, false).await
    }

    pub async fn enable(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl enable {name}"), true).await
    }

    pub async fn disable(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl disable {name}"), true)
            .await
    }

    pub async fn is_enabled(&self, name: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("systemctl is-enabled {name}"), false)
            .await
    }

    // ---------- Files and directories ----------

    /// Check a file or directory exists
    ///
    /// Linux paths (containing `/`) are tested on the remote host. Windows
    /// paths (containing `\`, e.g. a UNC share) are tested locally.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        if path.contains('/') {
            self.remote_exists(path).await
        } else if path.contains('\\') {
            Ok(tokio::fs::try_exists(Path::new(path)).await?)
        } else {
            Err(RemoteError::invalid_params(format!(
                "Not a Linux or Windows path: {path}"
            )))
        }
    }

    pub async fn cat_file(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("cat {path}"), false).await
    }

    /// Read a remote file and parse it as JSON
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let file = self.cat_file(path).await?;
        if !file.ok() {
            return Err(RemoteError::invalid_params(format!(
                "Cannot read {}: {}",
                path,
                file.stderr().unwrap_or("exit status non-zero")
            )));
        }
        Ok(serde_json::from_str(file.stdout().unwrap_or_default())?)
    }

    pub async fn create_file(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("touch {path}"), true).await
    }

    /// Permissions in `ls` notation, e.g. `-rw-r--r--`
    pub async fn get_file_permissions(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!(r#"stat -c "%A" {path}"#), false).await
    }

    /// Size in bytes
    pub async fn get_file_size(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!(r#"stat -c "%s" {path}"#), false).await
    }

    /// Grep with line numbers; `directory` greps recursively
    pub async fn grep_line_in_file(
        &self,
        path: &str,
        pattern: &str,
        directory: bool,
    ) -> Result<CommandResult> {
        let flags = if directory { "-rn" } else { "-n" };
        self.run_cmd(&format!(r#"grep {flags} "{pattern}" {path}"#), false)
            .await
    }

    /// Replace the first `old` with `new` on each line, in place
    pub async fn change_line_in_file(
        &self,
        path: &str,
        old: &str,
        new: &str,
    ) -> Result<CommandResult> {
        self.run_cmd(&format!(r#"sed -i "s!{old}!{new}!" {path}"#), true)
            .await
    }

    /// Delete every line matching `pattern`, in place
    pub async fn delete_line_from_file(&self, path: &str, pattern: &str) -> Result<CommandResult> {
        self.run_cmd(&format!(r#"sed -i "/{pattern}/d" {path}"#), true)
            .await
    }

    /// Most recently modified entry in `directory` (home if empty),
    /// optionally filtered by `name`
    pub async fn get_last_file(&self, directory: &str, name: &str) -> Result<CommandResult> {
        let directory = if directory.is_empty() {
            format!("/home/{}", self.credentials().username)
        } else {
            directory.to_string()
        };
        let cmd = if name.is_empty() {
            format!("ls {directory} -Art | tail -n 1")
        } else {
            format!("ls {directory} -Art | grep {name} | tail -n 1")
        };
        self.run_cmd(&cmd, false).await
    }

    /// Remove files or directories; `path` may be a glob such as `/opt/1/*`
    pub async fn remove(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!(r#"for file in {path}; do rm -rf "$file"; done"#), true)
            .await
    }

    /// Extract an archive into `dst`
    ///
    /// For [`Archive::Tar`], `src` is given without the `.tar.gz` suffix.
    pub async fn extract_files(
        &self,
        src: &str,
        dst: &str,
        mode: Archive,
        quiet: bool,
    ) -> Result<CommandResult> {
        let cmd = match mode {
            Archive::Tar => format!("tar -xzvf {src}.tar.gz -C {dst}"),
            Archive::Zip if quiet => format!("unzip -q {src} -d {dst}"),
            Archive::Zip => format!("unzip {src} -d {dst}"),
        };
        self.run_cmd(&cmd, false).await
    }

    pub async fn copy_file(&self, src: &str, dst: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("cp {src} {dst}"), true).await
    }

    pub async fn create_directory(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("mkdir {path}"), true).await
    }

    /// `ls`, with `params` appended as flags (e.g. `"la"`)
    pub async fn list_dir(&self, path: &str, params: Option<&str>) -> Result<CommandResult> {
        let cmd = match params {
            Some(params) => format!("ls {path} -{params}"),
            None => format!("ls {path}"),
        };
        self.run_cmd(&cmd, false).await
    }

    pub async fn count_files(&self, path: &str) -> Result<CommandResult> {
        self.run_cmd(&format!("ls {path} | wc -l"), false).await
    }

    // ---------- Aliases ----------

    pub async fn ps(&self) -> Result<CommandResult> {
        self.get_processes().await
    }

    pub async fn ls(&self, path: &str, params: Option<&str>) -> Result<CommandResult> {
        self.list_dir(path, params).await
    }

    pub async fn cp(&self, src: &str, dst: &str) -> Result<CommandResult> {
        self.copy_file(src, dst).await
    }

    pub async fn rm(&self, path: &str) -> Result<CommandResult> {
        self.remove(path).await
    }

    pub async fn date(&self) -> Result<CommandResult> {
        self.get_date().await
    }

    pub async fn status(&self, name: &str) -> Result<CommandResult> {
        self.get_service_status(name).await
    }

    pub async fn start(&self, name: &str) -> Result<CommandResult> {
        self.start_service(name).await
    }

    pub async fn stop(&self, name: &str) -> Result<CommandResult> {
        self.stop_service(name).await
    }

    pub async fn restart(&self, name: &str) -> Result<CommandResult> {
        self.restart_service(name).await
    }

    pub async fn count(&self, path: &str) -> Result<CommandResult> {
        self.count_files(path).await
    }
}
