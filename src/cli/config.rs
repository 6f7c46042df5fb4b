//! Configuration file
//!
//! ```json
//! {
//!   "server":   { "host": "0.0.0.0", "port": 3000, "cors_origins": [], "request_timeout_secs": 30 },
//!   "database": { "url": "sqlite://shelf.db", "max_connections": 8, ... },
//!   "logging":  { "format": "json" }
//! }
//! ```
//!
//! Every field has a default, so a partial file (or no file) is valid.
//! `DATABASE_URL`, `PORT` and `SHELF_LOG_FORMAT` override the file.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::LoggingConfig;
use crate::storage::DatabaseConfig;

use super::errors::{CliError, CliResult};

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: HttpServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CliError::config_error(format!(
                    "Failed to read config {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| CliError::config_error(format!("PORT is not a valid port: '{}'", port)))?;
        }
        if let Some(format) = lookup("SHELF_LOG_FORMAT") {
            self.logging.format = format
                .parse()
                .map_err(|e: String| CliError::config_error(format!("SHELF_LOG_FORMAT: {}", e)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> CliResult<()> {
        self.server.validate().map_err(CliError::config_error)?;
        self.database.validate().map_err(CliError::config_error)?;
        Ok(())
    }

    /// Pretty JSON written by `shelf init`
    pub fn to_json(&self) -> CliResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
