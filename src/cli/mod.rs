//! CLI module for shelf
//!
//! Provides command-line interface for:
//! - init: Write a default config file and create the schema
//! - start: Boot the store and serve HTTP

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command, DEFAULT_CONFIG_PATH};
pub use commands::{init, run, run_command, start};
pub use config::AppConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
