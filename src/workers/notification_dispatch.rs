use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::db::operations::notifications::{fetch_pending, mark_failed, mark_sent};
use crate::db::DatabaseProxy;
use crate::services::notifier::NotificationChannel;

const BATCH_SIZE: i64 = 10;

#[derive(Debug, Default)]
struct DispatchStats {
    fetched: i64,
    sent: i64,
    failed: i64,
    duration_secs: f64,
}

/// Drains up to [`BATCH_SIZE`] pending notifications. A delivery failure
/// marks that row `failed` and the batch continues.
pub async fn dispatch_pending(
    db: Arc<DatabaseProxy>,
    notifier: Arc<NotificationChannel>,
) -> Result<(), super::WorkerError> {
    let start = Instant::now();

    let pool = db.pool();
    let pending = fetch_pending(pool, BATCH_SIZE).await?;

    if pending.is_empty() {
        debug!("No pending notifications");
        return Ok(());
    }

    let mut stats = DispatchStats {
        fetched: pending.len() as i64,
        ..Default::default()
    };

    for notification in &pending {
        match notifier.deliver(notification).await {
            Ok(()) => {
                mark_sent(pool, &notification.id).await?;
                stats.sent += 1;
            }
            Err(e) => {
                stats.failed += 1;
                error!(
                    notification_id = %notification.id,
                    user_id = %notification.user_id,
                    error = %e,
                    "Notification delivery failed"
                );
                if let Err(mark_err) = mark_failed(pool, &notification.id).await {
                    error!(notification_id = %notification.id, error = %mark_err, "Failed to mark notification failed");
                }
            }
        }
    }

    stats.duration_secs = start.elapsed().as_secs_f64();

    info!(
        fetched = stats.fetched,
        sent = stats.sent,
        failed = stats.failed,
        duration_secs = format!("{:.2}", stats.duration_secs),
        "Notification dispatch completed"
    );

    Ok(())
}
