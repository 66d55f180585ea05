//! loandesk - command line admin console for the loan management backend.
//!
//! Each subcommand plays the part of one screen of the web console:
//! it collects fields, makes a single guarded call through `ApiClient`
//! and prints the result.

mod cli;
mod commands;
mod render;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use loandesk_core::{ApiClient, ApiError, Config};

/// Exit code when the user has to log in (again)
const EXIT_LOGIN_REQUIRED: u8 = 2;

const EXIT_FAILURE: u8 = 1;

/// Log file name, created next to the session file
const LOG_FILE: &str = "loandesk.log";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = if cli.log_file {
        config.cache_dir().ok()
    } else {
        None
    };
    let _log_guard = init_tracing(log_dir.as_deref());

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url());
    info!(api_url = %api_url, "loandesk starting");

    let session = config.session()?;
    let client = ApiClient::with_timeout(&api_url, session, config.request_timeout())?;

    commands::dispatch(&client, &mut config, cli.command, cli.json).await
}

/// Message to print for a failed command, and the exit code to use.
fn describe_failure(err: &anyhow::Error) -> (String, u8) {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::LoginRequired) => (
            "Not logged in or session expired. Run `loandesk login` first.".to_string(),
            EXIT_LOGIN_REQUIRED,
        ),
        Some(api) => (format!("Error: {}", api.user_message()), EXIT_FAILURE),
        None => (format!("Error: {:#}", err), EXIT_FAILURE),
    }
}

/// Print an error the way the console showed it and pick the exit code.
fn report(err: anyhow::Error) -> ExitCode {
    debug!(error = ?err, "Command failed");
    let (message, code) = describe_failure(&err);
    eprintln!("{}", message);
    ExitCode::from(code)
}
