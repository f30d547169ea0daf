use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info};

use crate::db::operations::{mastery, profiles};
use crate::db::DatabaseProxy;
use crate::services::mastery::compute_skill_mastery;

#[derive(Debug, Default)]
struct MasteryStats {
    students_processed: i64,
    students_failed: i64,
    skills_upserted: i64,
    duration_secs: f64,
}

/// Refreshes per-skill mastery for every student on the roster. A failing
/// student is logged and skipped; the batch always runs to the end.
pub async fn refresh_all_mastery(db: Arc<DatabaseProxy>) -> Result<(), super::WorkerError> {
    let start = Instant::now();
    info!("Starting mastery compute run");

    let pool = db.pool();
    let students = profiles::list_students(pool).await?;

    let mut stats = MasteryStats::default();
    let run_started_at = Utc::now();

    for student in &students {
        match refresh_student(&db, &student.id, &mut stats).await {
            Ok(()) => stats.students_processed += 1,
            Err(e) => {
                stats.students_failed += 1;
                error!(student_id = %student.id, error = %e, "Failed to compute mastery for student");
            }
        }
    }

    stats.duration_secs = start.elapsed().as_secs_f64();

    info!(
        students_processed = stats.students_processed,
        students_failed = stats.students_failed,
        skills_upserted = stats.skills_upserted,
        run_started_at = %run_started_at,
        duration_secs = format!("{:.2}", stats.duration_secs),
        "Mastery compute run completed"
    );

    Ok(())
}

async fn refresh_student(
    db: &DatabaseProxy,
    student_id: &str,
    stats: &mut MasteryStats,
) -> Result<(), sqlx::Error> {
    let pool = db.pool();
    let skills = compute_skill_mastery(pool, student_id).await?;
    let assessed_at = Utc::now();

    for skill in skills {
        mastery::upsert_mastery(
            pool,
            student_id,
            &skill.skill_id,
            skill.mastery_level,
            assessed_at,
        )
        .await?;
        stats.skills_upserted += 1;
    }

    Ok(())
}
