//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `DB_MIN_IDLE` - Idle connections kept open (default: 2)
//! - `DB_MAX_LIFETIME_SECS` - Connection lifetime cap (default: 1800)
//! - `DB_CONNECT_TIMEOUT_SECS` - Wait for a pooled connection (default: 5)
//! - `DB_STATEMENT_TIMEOUT_MS` - Per-statement deadline, 0 disables (default: 5000)
//! - `PAYMENT_BASE_URL` - Base of the stub payment redirect (default: http://localhost:8080/pay)
//! - `PROVIDER_HTTP_TIMEOUT_SECS` - Carrier API request timeout (default: 10)

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::db::PoolSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub pool: PoolSettings,
    pub payment_base_url: String,
    pub provider_http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let mut pool = PoolSettings::for_url(&database_url);
        pool.max_connections = parse_or(vars, "DB_MAX_CONNECTIONS", pool.max_connections)?;
        pool.min_idle = parse_or(vars, "DB_MIN_IDLE", pool.min_idle)?;
        pool.max_lifetime = Duration::from_secs(parse_or(vars, "DB_MAX_LIFETIME_SECS", 1800)?);
        pool.connect_timeout = Duration::from_secs(parse_or(vars, "DB_CONNECT_TIMEOUT_SECS", 5)?);
        pool.statement_timeout =
            Duration::from_millis(parse_or(vars, "DB_STATEMENT_TIMEOUT_MS", 5000)?);
        if pool.max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: vars
                .get("HOST")
                .cloned()
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(vars, "PORT", 8080)?,
            pool,
            payment_base_url: vars
                .get("PAYMENT_BASE_URL")
                .cloned()
                .unwrap_or_else(|| "http://localhost:8080/pay".to_string()),
            provider_http_timeout: Duration::from_secs(parse_or(
                vars,
                "PROVIDER_HTTP_TIMEOUT_SECS",
                10,
            )?),
        })
    }
}

fn parse_or<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
    }
}
