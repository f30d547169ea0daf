use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::db::operations::content::{enqueue_request, NewContentRequest};
use crate::db::operations::engagement::{insert_engagement_event, EVENT_ADAPTIVE_ASSIGNMENT};
use crate::db::operations::mastery;
use crate::db::DatabaseProxy;

const PRACTICE_THRESHOLD: f64 = 60.0;
const HARD_THRESHOLD: f64 = 30.0;
const DEFAULT_REQUEST_TYPE: &str = "practice_set";
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Default)]
struct AssignmentStats {
    pairs_scanned: i64,
    requests_enqueued: i64,
    duplicates_skipped: i64,
    failures: i64,
    students_assigned: i64,
    duration_secs: f64,
}

pub fn difficulty_for(mastery_level: f64) -> &'static str {
    if mastery_level < HARD_THRESHOLD {
        "Hard"
    } else {
        "Medium"
    }
}

/// Enqueues a content request per deficient (student, skill) pair. The
/// partial unique index makes a re-run before the queue drains a no-op for
/// pairs that are still queued.
pub async fn assign_adaptive_content(db: Arc<DatabaseProxy>) -> Result<(), super::WorkerError> {
    let start = Instant::now();
    info!("Starting adaptive content assignment");

    let pool = db.pool();
    let deficient = mastery::list_students_needing_practice(pool, PRACTICE_THRESHOLD).await?;

    let mut stats = AssignmentStats::default();
    stats.pairs_scanned = deficient.len() as i64;

    let mut assigned_students: HashSet<String> = HashSet::new();

    for pair in &deficient {
        let request = NewContentRequest {
            org_id: &pair.org_id,
            requested_by: &pair.student_id,
            request_type: DEFAULT_REQUEST_TYPE,
            grade: pair.grade.as_deref().unwrap_or(""),
            subject: skill_subject(&pair.skill_id),
            skill: &pair.skill_id,
            difficulty: difficulty_for(pair.mastery_level),
            language: DEFAULT_LANGUAGE,
            prompt: None,
            preferred_provider: None,
        };

        match enqueue_request(pool, &request).await {
            Ok(true) => {
                stats.requests_enqueued += 1;
                assigned_students.insert(pair.student_id.clone());

                if let Err(e) = insert_engagement_event(
                    pool,
                    &pair.student_id,
                    EVENT_ADAPTIVE_ASSIGNMENT,
                    Some(&pair.skill_id),
                )
                .await
                {
                    error!(
                        student_id = %pair.student_id,
                        skill_id = %pair.skill_id,
                        error = %e,
                        "Failed to record engagement event"
                    );
                }
            }
            Ok(false) => stats.duplicates_skipped += 1,
            Err(e) => {
                stats.failures += 1;
                error!(
                    student_id = %pair.student_id,
                    skill_id = %pair.skill_id,
                    error = %e,
                    "Failed to enqueue content request"
                );
            }
        }
    }

    stats.students_assigned = assigned_students.len() as i64;
    stats.duration_secs = start.elapsed().as_secs_f64();

    info!(
        pairs_scanned = stats.pairs_scanned,
        requests_enqueued = stats.requests_enqueued,
        duplicates_skipped = stats.duplicates_skipped,
        failures = stats.failures,
        students_assigned = stats.students_assigned,
        duration_secs = format!("{:.2}", stats.duration_secs),
        "Adaptive content assignment completed"
    );

    Ok(())
}

// Skill ids are namespaced "subject.topic"; the subject prefix feeds the
// cache key so content generated for one subject never leaks into another.
fn skill_subject(skill_id: &str) -> &str {
    skill_id.split('.').next().unwrap_or(skill_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_mastery_is_hard() {
        assert_eq!(difficulty_for(0.0), "Hard");
        assert_eq!(difficulty_for(29.9), "Hard");
    }

    #[test]
    fn boundary_and_above_is_medium() {
        assert_eq!(difficulty_for(30.0), "Medium");
        assert_eq!(difficulty_for(59.9), "Medium");
    }

    #[test]
    fn subject_prefix_extraction() {
        assert_eq!(skill_subject("math.fractions"), "math");
        assert_eq!(skill_subject("reading"), "reading");
    }
}
