pub mod config;
pub mod migrate;
pub mod operations;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::db::config::{DbConfig, DbConfigError};

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("database config error: {0}")]
    Config(#[from] DbConfigError),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] migrate::MigrationError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct HealthTracker {
    healthy: bool,
    consecutive_failures: u32,
    last_checked: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl HealthTracker {
    fn new() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_checked: None,
            last_error: None,
        }
    }

    fn record_success(&mut self) {
        self.healthy = true;
        self.consecutive_failures = 0;
        self.last_checked = Some(Utc::now());
        self.last_error = None;
    }

    fn record_failure(&mut self, error: String) {
        self.consecutive_failures += 1;
        self.healthy = false;
        self.last_checked = Some(Utc::now());
        self.last_error = Some(error);
    }

    fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self.healthy,
            consecutive_failures: self.consecutive_failures,
            last_checked: self.last_checked,
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: PgPool,
    health: Arc<RwLock<HealthTracker>>,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;

        if config.auto_migrate {
            migrate::run_migrations(&pool).await?;
        }

        let proxy = Arc::new(Self {
            health: Arc::new(RwLock::new(HealthTracker::new())),
            config,
            pool,
        });

        proxy.start_health_monitor();

        Ok(proxy)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_status(&self) -> HealthSnapshot {
        self.health.read().await.snapshot()
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn start_health_monitor(self: &Arc<Self>) {
        let proxy = Arc::clone(self);
        tokio::spawn(async move {
            proxy.health_monitor_loop().await;
        });
    }

    async fn health_monitor_loop(self: Arc<Self>) {
        let interval = self.config.health_check_interval;

        loop {
            match self.ping().await {
                Ok(()) => {
                    self.health.write().await.record_success();
                }
                Err(err) => {
                    let mut tracker = self.health.write().await;
                    tracker.record_failure(err.to_string());
                    tracing::warn!(
                        error = %err,
                        consecutive_failures = tracker.consecutive_failures,
                        "database health check failed"
                    );
                }
            }

            tokio::time::sleep(interval).await;
        }
    }
}
