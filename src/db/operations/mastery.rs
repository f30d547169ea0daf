use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

/// Overwrite semantics: one row per (student, skill), refreshed on every
/// compute run with no history retained.
pub async fn upsert_mastery(
    pool: &PgPool,
    student_id: &str,
    skill_id: &str,
    mastery_level: f64,
    assessed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "student_skill_mastery" ("id", "studentId", "skillId", "masteryLevel", "lastAssessed")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("studentId", "skillId")
        DO UPDATE SET
            "masteryLevel" = EXCLUDED."masteryLevel",
            "lastAssessed" = EXCLUDED."lastAssessed"
        "#,
    )
    .bind(&id)
    .bind(student_id)
    .bind(skill_id)
    .bind(mastery_level)
    .bind(assessed_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct DeficientSkill {
    pub student_id: String,
    pub org_id: String,
    pub grade: Option<String>,
    pub skill_id: String,
    pub mastery_level: f64,
}

/// (student, skill) pairs below the practice threshold, joined with the
/// roster so the assignment worker has org/grade context for the request.
pub async fn list_students_needing_practice(
    pool: &PgPool,
    threshold: f64,
) -> Result<Vec<DeficientSkill>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m."studentId", m."skillId", m."masteryLevel", p."orgId", p."grade"
        FROM "student_skill_mastery" m
        INNER JOIN "profiles" p ON p."id" = m."studentId"
        WHERE p."role" = 'student' AND m."masteryLevel" < $1
        ORDER BY m."masteryLevel"
        "#,
    )
    .bind(threshold)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let student_id: Option<String> = r.try_get("studentId").ok();
            let skill_id: Option<String> = r.try_get("skillId").ok();
            let org_id: Option<String> = r.try_get("orgId").ok();
            match (student_id, skill_id, org_id) {
                (Some(student_id), Some(skill_id), Some(org_id)) => Some(DeficientSkill {
                    student_id,
                    org_id,
                    grade: r.try_get("grade").ok().flatten(),
                    skill_id,
                    mastery_level: r.try_get("masteryLevel").unwrap_or(0.0),
                }),
                _ => None,
            }
        })
        .collect())
}
