//! Application configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then `LEDGER__*`
//! environment variables (a `.env` file is read first when present).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::LedgerResult;
use crate::seed::ReservedNames;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub database: DatabaseConfig,
    pub ledger: LedgerSettings,
    pub server: ServerConfig,
    pub defaults: DefaultsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, created on first use.
    pub path: PathBuf,
    /// Enable WAL journaling.
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: PathBuf::from("data/finance.db"),
            wal: true,
        }
    }
}

/// Names of the reserved categories.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub invoice_category: String,
    pub adjustment_category: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        let names = ReservedNames::default();
        LedgerSettings {
            invoice_category: names.invoice,
            adjustment_category: names.adjustment,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the CLI keeps its last-used entry values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub path: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            path: PathBuf::from("data/last_entry.json"),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from `path` (required when given), or from an
    /// optional `ledger.toml` in the working directory, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or has the wrong shape.
    pub fn load(path: Option<&Path>) -> LedgerResult<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("ledger").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn reserved_names(&self) -> ReservedNames {
        ReservedNames {
            invoice: self.ledger.invoice_category.clone(),
            adjustment: self.ledger.adjustment_category.clone(),
        }
    }
}
