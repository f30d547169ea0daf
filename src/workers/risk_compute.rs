use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{error, info};

use crate::db::operations::notifications::enqueue_notification;
use crate::db::operations::profiles;
use crate::db::operations::risk::{insert_risk_score, recent_performance};
use crate::db::DatabaseProxy;
use crate::services::risk::{assess, RiskLevel, INACTIVITY_SENTINEL_DAYS};

const LOOKBACK_DAYS: i64 = 14;

#[derive(Debug, Default)]
pub struct RiskRunStats {
    pub students_processed: i64,
    pub students_failed: i64,
    pub high_risk: i64,
    pub notifications_enqueued: i64,
}

/// Scheduled entry point: recompute risk for every org on the roster.
pub async fn compute_all_orgs(db: Arc<DatabaseProxy>) -> Result<(), super::WorkerError> {
    let start = Instant::now();
    info!("Starting risk compute run");

    let pool = db.pool();
    let org_ids = profiles::list_org_ids(pool).await?;

    let mut total = RiskRunStats::default();

    for org_id in &org_ids {
        match compute_org_risk(pool, org_id).await {
            Ok(stats) => {
                total.students_processed += stats.students_processed;
                total.students_failed += stats.students_failed;
                total.high_risk += stats.high_risk;
                total.notifications_enqueued += stats.notifications_enqueued;
            }
            Err(e) => {
                error!(org_id = %org_id, error = %e, "Risk compute failed for org");
            }
        }
    }

    info!(
        orgs = org_ids.len(),
        students_processed = total.students_processed,
        students_failed = total.students_failed,
        high_risk = total.high_risk,
        notifications_enqueued = total.notifications_enqueued,
        duration_secs = format!("{:.2}", start.elapsed().as_secs_f64()),
        "Risk compute run completed"
    );

    Ok(())
}

/// Computes and appends a risk score for every student in the org. Shared by
/// the scheduled job and the `/api/risk/compute` endpoint. A failing student
/// is logged and skipped so one bad record cannot sink the batch.
pub async fn compute_org_risk(
    pool: &PgPool,
    org_id: &str,
) -> Result<RiskRunStats, super::WorkerError> {
    let students = profiles::list_org_students(pool, org_id).await?;
    let mut stats = RiskRunStats::default();

    for student in &students {
        match compute_student_risk(pool, org_id, &student.id, &mut stats).await {
            Ok(()) => stats.students_processed += 1,
            Err(e) => {
                stats.students_failed += 1;
                error!(
                    org_id = %org_id,
                    student_id = %student.id,
                    error = %e,
                    "Failed to compute risk for student"
                );
            }
        }
    }

    Ok(stats)
}

async fn compute_student_risk(
    pool: &PgPool,
    org_id: &str,
    student_id: &str,
    stats: &mut RiskRunStats,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let since = now - Duration::days(LOOKBACK_DAYS);
    let records = recent_performance(pool, student_id, since).await?;

    let quiz_count = records.len();
    let avg_score = if quiz_count == 0 {
        0.0
    } else {
        records.iter().map(|r| r.score).sum::<f64>() / quiz_count as f64
    };

    // Most recent first; sentinel when the window holds nothing.
    let inactivity_days = records
        .first()
        .map(|r| (now - r.completed_at).num_seconds() as f64 / 86_400.0)
        .unwrap_or(INACTIVITY_SENTINEL_DAYS);

    let assessment = assess(avg_score, quiz_count, inactivity_days);

    insert_risk_score(
        pool,
        org_id,
        student_id,
        None,
        assessment.level.as_str(),
        assessment.score,
        &assessment.top_factors,
        &assessment.recommended_actions,
    )
    .await?;

    if assessment.level == RiskLevel::High {
        stats.high_risk += 1;

        enqueue_notification(
            pool,
            org_id,
            student_id,
            "risk_alert",
            "Student flagged as high risk",
            "Recent performance and activity indicate this student needs attention.",
        )
        .await?;
        stats.notifications_enqueued += 1;
    }

    Ok(())
}
