//! CLI argument definitions using clap
//!
//! Commands:
//! - shelf init --config <path> [--force]
//! - shelf start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "./shelf.json";

/// shelf - authors and their books over HTTP
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Write a default configuration file and create the database schema
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP server
    Start {
        /// Path to configuration file
        #[arg(long, env = "SHELF_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["shelf", "init"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Init {
                config: PathBuf::from(DEFAULT_CONFIG_PATH),
                force: false
            }
        );
    }

    #[test]
    fn test_start_with_config() {
        let cli = Cli::try_parse_from(["shelf", "start", "--config", "/etc/shelf.json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Start {
                config: PathBuf::from("/etc/shelf.json")
            }
        );
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Cli::try_parse_from(["shelf", "query"]).is_err());
    }
}
