use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Where the record store keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// In-memory store mirrored to a JSON snapshot file
    File(PathBuf),
    Memory,
}

/// Runtime settings for the dashboard server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub seed_defaults: bool,
}

impl AppConfig {
    /// Reads settings from the process environment, after loading `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup
    ///
    /// `DATABASE_URL` wins over `DATA_FILE`; with neither set the store
    /// lives only in memory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let backend = if let Some(database_url) = non_empty("DATABASE_URL") {
            let max_connections = match non_empty("DB_MAX_CONNECTIONS") {
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: "DB_MAX_CONNECTIONS",
                            value: raw,
                        })
                    }
                },
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StoreBackend::Postgres {
                database_url,
                max_connections,
            }
        } else if let Some(path) = non_empty("DATA_FILE") {
            StoreBackend::File(PathBuf::from(path))
        } else {
            StoreBackend::Memory
        };

        let seed_defaults = match non_empty("SEED_DEFAULTS") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                key: "SEED_DEFAULTS",
                value: raw,
            })?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            backend,
            seed_defaults,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
