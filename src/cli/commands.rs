//! CLI command implementations
//!
//! `init` writes a configuration file and prepares the database; `start`
//! boots the store and serves HTTP until Ctrl-C. Both build their own tokio
//! runtime so `main` stays synchronous.

use std::env;
use std::fs;
use std::path::Path;

use crate::catalog::Catalog;
use crate::http_server::HttpServer;
use crate::observability::init_logging;
use crate::storage::Store;

use super::args::Command;
use super::config::AppConfig;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, force } => init(&config, force),
        Command::Start { config } => start(&config),
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Write a default configuration file and create the schema
///
/// Refuses to overwrite an existing file unless `force` is set. The file is
/// written last, so a failed validation or bootstrap leaves nothing behind
/// and `init` can simply be rerun.
pub fn init(config_path: &Path, force: bool) -> CliResult<()> {
    init_with_env(config_path, force, process_env)
}

fn init_with_env<F>(config_path: &Path, force: bool, lookup: F) -> CliResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if config_path.exists() && !force {
        return Err(CliError::already_initialized(config_path.display()));
    }

    let written = AppConfig::default();
    let contents = written.to_json()?;

    let mut config = written;
    config.apply_overrides(lookup)?;
    config.validate()?;

    runtime()?.block_on(async {
        let store = Store::connect(&config.database).await?;
        store.ensure_schema().await?;
        store.close().await;
        Ok::<_, CliError>(())
    })?;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CliError::write_failed(parent, e))?;
    }
    fs::write(config_path, contents).map_err(|e| CliError::write_failed(config_path, e))?;

    println!("Wrote {}", config_path.display());
    println!("Database ready at {}", config.database.url);
    Ok(())
}

/// Boot the store and serve until Ctrl-C
pub fn start(config_path: &Path) -> CliResult<()> {
    let mut config = AppConfig::load(config_path)?;
    config.apply_overrides(process_env)?;
    config.validate()?;

    init_logging(&config.logging);
    tracing::info!(
        config = %config_path.display(),
        database = %config.database.url,
        addr = %config.server.socket_addr(),
        "starting shelf"
    );

    runtime()?.block_on(async {
        let store = Store::connect(&config.database).await?;
        store.ensure_schema().await?;

        let server = HttpServer::new(config.server.clone(), Catalog::new(store.clone()));
        let served = server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)));

        store.close().await;
        served
    })
}
