use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub health_check_interval: Duration,
    pub auto_migrate: bool,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(DbConfigError::Missing {
                key: "DATABASE_URL",
            })?;

        let max_connections = env_u32("DB_MAX_CONNECTIONS", 10);
        let acquire_timeout = Duration::from_millis(env_u64("DB_ACQUIRE_TIMEOUT_MS", 5000));
        let health_check_interval =
            Duration::from_millis(env_u64("DB_HEALTH_CHECK_INTERVAL_MS", 30_000));
        let auto_migrate = env_bool("DB_AUTO_MIGRATE", true);

        Ok(Self {
            url,
            max_connections,
            acquire_timeout,
            health_check_interval,
            auto_migrate,
        })
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("missing required environment variable: {key}")]
    Missing { key: &'static str },
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
