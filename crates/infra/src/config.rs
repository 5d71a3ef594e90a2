//! Process configuration from environment variables.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `DATABASE_URL` | unset | Postgres URL; unset selects the in-memory store |
//! | `LOG_FORMAT` | `json` | `json` or `pretty` |
//!
//! A `.env` file in the working directory is loaded first if present.

use std::net::SocketAddr;

use thiserror::Error;

use autoproposal_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load `.env` (if any), then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                key: "LOG_FORMAT",
                message: e.to_string(),
            })?,
            None => LogFormat::default(),
        };

        let database_url = get("DATABASE_URL");
        if let Some(url) = &database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::Invalid {
                    key: "DATABASE_URL",
                    message: "expected a postgres:// or postgresql:// URL".to_string(),
                });
            }
        }

        Ok(Self {
            bind_addr,
            database_url,
            log_format,
        })
    }
}
