mod content_assignment;
mod content_queue;
mod mastery_compute;
mod notification_dispatch;
pub mod risk_compute;

pub use content_assignment::assign_adaptive_content;
pub use content_queue::drain_content_queue;
pub use mastery_compute::refresh_all_mastery;
pub use notification_dispatch::dispatch_pending;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::db::DatabaseProxy;
use crate::services::content_provider::ContentProvider;
use crate::services::notifier::NotificationChannel;

static WORKER_LEADER: AtomicBool = AtomicBool::new(false);

pub fn is_worker_leader() -> bool {
    WORKER_LEADER.load(Ordering::Relaxed)
}

fn set_worker_leader(val: bool) {
    WORKER_LEADER.store(val, Ordering::Relaxed);
}

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    db_proxy: Arc<DatabaseProxy>,
    content_provider: Arc<ContentProvider>,
    notifier: Arc<NotificationChannel>,
}

impl WorkerManager {
    pub async fn new(
        db_proxy: Arc<DatabaseProxy>,
        content_provider: Arc<ContentProvider>,
        notifier: Arc<NotificationChannel>,
    ) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await.map_err(WorkerError::Scheduler)?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            db_proxy,
            content_provider,
            notifier,
        })
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        let leader = std::env::var("WORKER_LEADER")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        if !leader {
            info!("WORKER_LEADER not set, skipping worker startup");
            return Ok(());
        }

        set_worker_leader(true);
        info!("Starting workers (leader mode)");

        let scheduler = self.scheduler.lock().await;

        if worker_enabled("ENABLE_MASTERY_COMPUTE_WORKER") {
            let schedule = env_schedule("MASTERY_COMPUTE_SCHEDULE", "0 0 1 * * *");
            let db = Arc::clone(&self.db_proxy);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(&schedule, move |_uuid, _lock| {
                let db = Arc::clone(&db);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = mastery_compute::refresh_all_mastery(db) => {
                            if let Err(e) = result {
                                error!(error = %e, "Mastery compute worker error");
                            }
                        }
                    }
                })
            })
            .map_err(WorkerError::Scheduler)?;
            scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
            info!(schedule = %schedule, "Mastery compute worker scheduled");
        }

        if worker_enabled("ENABLE_CONTENT_ASSIGNMENT_WORKER") {
            let schedule = env_schedule("CONTENT_ASSIGNMENT_SCHEDULE", "0 30 1 * * *");
            let db = Arc::clone(&self.db_proxy);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(&schedule, move |_uuid, _lock| {
                let db = Arc::clone(&db);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = content_assignment::assign_adaptive_content(db) => {
                            if let Err(e) = result {
                                error!(error = %e, "Content assignment worker error");
                            }
                        }
                    }
                })
            })
            .map_err(WorkerError::Scheduler)?;
            scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
            info!(schedule = %schedule, "Content assignment worker scheduled");
        }

        if worker_enabled("ENABLE_CONTENT_QUEUE_WORKER") {
            let schedule = env_schedule("CONTENT_QUEUE_SCHEDULE", "0 * * * * *");
            let db = Arc::clone(&self.db_proxy);
            let provider = Arc::clone(&self.content_provider);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(&schedule, move |_uuid, _lock| {
                let db = Arc::clone(&db);
                let provider = Arc::clone(&provider);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = content_queue::drain_content_queue(db, provider) => {
                            if let Err(e) = result {
                                error!(error = %e, "Content queue worker error");
                            }
                        }
                    }
                })
            })
            .map_err(WorkerError::Scheduler)?;
            scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
            info!(schedule = %schedule, "Content queue worker scheduled");
        }

        if worker_enabled("ENABLE_RISK_COMPUTE_WORKER") {
            let schedule = env_schedule("RISK_COMPUTE_SCHEDULE", "0 0 2 * * *");
            let db = Arc::clone(&self.db_proxy);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(&schedule, move |_uuid, _lock| {
                let db = Arc::clone(&db);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = risk_compute::compute_all_orgs(db) => {
                            if let Err(e) = result {
                                error!(error = %e, "Risk compute worker error");
                            }
                        }
                    }
                })
            })
            .map_err(WorkerError::Scheduler)?;
            scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
            info!(schedule = %schedule, "Risk compute worker scheduled");
        }

        if worker_enabled("ENABLE_NOTIFICATION_WORKER") {
            let schedule = env_schedule("NOTIFICATION_DISPATCH_SCHEDULE", "30 * * * * *");
            let db = Arc::clone(&self.db_proxy);
            let notifier = Arc::clone(&self.notifier);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(&schedule, move |_uuid, _lock| {
                let db = Arc::clone(&db);
                let notifier = Arc::clone(&notifier);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = notification_dispatch::dispatch_pending(db, notifier) => {
                            if let Err(e) = result {
                                error!(error = %e, "Notification dispatch worker error");
                            }
                        }
                    }
                })
            })
            .map_err(WorkerError::Scheduler)?;
            scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
            info!(schedule = %schedule, "Notification dispatch worker scheduled");
        }

        scheduler.start().await.map_err(WorkerError::Scheduler)?;
        info!("All workers started");

        Ok(())
    }

    pub async fn stop(&self) {
        if !is_worker_leader() {
            return;
        }

        info!("Stopping workers...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }

        set_worker_leader(false);
        info!("Workers stopped");
    }
}

fn worker_enabled(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true)
}

fn env_schedule(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Content provider error: {0}")]
    Provider(#[from] crate::services::content_provider::ContentProviderError),
}
