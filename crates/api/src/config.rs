//! Process configuration for the notification center server.
//!
//! One [`AppConfig`] is built at startup from the environment (after
//! `.env` is loaded) and carries the HTTP settings, the database URL, the
//! retention cadence and the engine tunables.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use mota_engine::EngineConfig;

/// Default CORS origin for the local web client.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    /// Requests running longer than this get `408`.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for the retention job.
    pub shutdown_timeout_secs: u64,
    /// Seconds between retention purges.
    pub retention_interval_secs: u64,
    pub database_url: String,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load from environment variables.
    ///
    /// | Env var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `DATABASE_URL`            | required                |
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `5`                     |
    /// | `RETENTION_INTERVAL_SECS` | `3600`                  |
    ///
    /// Engine variables are documented on [`EngineConfig::from_env`].
    ///
    /// # Panics
    ///
    /// When `DATABASE_URL` is missing or a numeric variable does not parse.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.into()),
            ),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 5),
            retention_interval_secs: env_or("RETENTION_INTERVAL_SECS", 3600),
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            engine: EngineConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        Ok(SocketAddr::new(IpAddr::from_str(&self.host)?, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Zero is clamped to one second; `tokio::time::interval` rejects zero.
    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_interval_secs.max(1))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
