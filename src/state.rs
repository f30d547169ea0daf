use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::DatabaseProxy;
use crate::services::content_provider::ContentProvider;
use crate::services::notifier::NotificationChannel;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Option<Arc<DatabaseProxy>>,
    content_provider: Arc<ContentProvider>,
    notifier: Arc<NotificationChannel>,
}

impl AppState {
    pub fn new(
        db_proxy: Option<Arc<DatabaseProxy>>,
        content_provider: Arc<ContentProvider>,
        notifier: Arc<NotificationChannel>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            content_provider,
            notifier,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn content_provider(&self) -> Arc<ContentProvider> {
        Arc::clone(&self.content_provider)
    }

    pub fn notifier(&self) -> Arc<NotificationChannel> {
        Arc::clone(&self.notifier)
    }
}
