//! linux-remote - Entry point
//!
//! Parses CLI arguments, validates configuration, runs one action and exits
//! with the remote command's exit status.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use linux_remote::config::{Action, Args, Config};
use linux_remote::error::Result;
use linux_remote::ssh::sanitize_command;
use linux_remote::{CommandResult, Credentials, LinuxClient};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries command output
    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(args)?;

    info!("linux-remote v{} starting...", env!("CARGO_PKG_VERSION"));

    let credentials = if config.action.is_remote() {
        info!(
            "Target {}@{}:{}, timeout {}ms",
            config.user, config.host, config.port, config.timeout_ms
        );
        config.credentials().await?
    } else {
        Credentials::new("localhost", "")
    };

    let client = LinuxClient::from_config(&config, credentials);

    match run(&client, &config).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}

async fn run(client: &LinuxClient, config: &Config) -> Result<ExitCode> {
    match &config.action {
        Action::Exec { command } => {
            let command = sanitize_command(command, config.max_chars)?;
            Ok(report(&client.run_cmd(&command, false).await?))
        }
        Action::SudoExec { command } => {
            let command = sanitize_command(command, config.max_chars)?;
            Ok(report(&client.run_cmd(&command, true).await?))
        }
        Action::Local { command } => {
            let command = sanitize_command(command, config.max_chars)?;
            println!("{}", client.run_cmd_local(&command).await?);
            Ok(ExitCode::SUCCESS)
        }
        Action::Upload { local, remote } => {
            let exists = client.upload(local, remote).await?;
            println!("{}", exists);
            Ok(success_if(exists))
        }
        Action::Download { remote, local } => {
            let exists = client.download(remote, local).await?;
            println!("{}", exists);
            Ok(success_if(exists))
        }
        Action::Check => {
            let available = client
                .is_host_available(None, client.options().connect_timeout)
                .await;
            let valid = available && client.is_credentials_valid().await?;
            println!("{}", client);
            println!("Host availability: {}", available);
            println!("Credentials are correct: {}", valid);
            Ok(success_if(valid))
        }
    }
}

/// Print stdout/stderr and map the remote exit status to ours
fn report(result: &CommandResult) -> ExitCode {
    if let Some(stdout) = result.stdout() {
        println!("{}", stdout);
    }
    if let Some(stderr) = result.stderr() {
        eprintln!("{}", stderr);
    }
    match u8::try_from(result.exited()) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

fn success_if(flag: bool) -> ExitCode {
    if flag {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
