use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

/// Quiz results for one student inside the risk lookback window.
pub async fn recent_performance(
    pool: &PgPool,
    student_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<PerformanceRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "score", "completedAt"
        FROM "quiz_results"
        WHERE "studentId" = $1 AND "completedAt" >= $2
        ORDER BY "completedAt" DESC
        "#,
    )
    .bind(student_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let completed_at: Option<DateTime<Utc>> = r.try_get("completedAt").ok();
            completed_at.map(|completed_at| PerformanceRecord {
                score: r.try_get("score").unwrap_or(0.0),
                completed_at,
            })
        })
        .collect())
}

/// Append-only: one row per compute run, history accumulates.
pub async fn insert_risk_score(
    pool: &PgPool,
    org_id: &str,
    student_id: &str,
    subject: Option<&str>,
    risk_level: &str,
    score: f64,
    top_factors: &serde_json::Value,
    recommended_actions: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "risk_scores"
            ("id", "orgId", "studentId", "subject", "riskLevel", "score",
             "topFactors", "recommendedActions", "createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&id)
    .bind(org_id)
    .bind(student_id)
    .bind(subject)
    .bind(risk_level)
    .bind(score)
    .bind(top_factors)
    .bind(recommended_actions)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
