use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct PracticeQuestion {
    pub id: String,
    pub session_id: String,
    pub correct_option: String,
    pub answered_correctly: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    pub id: String,
    pub position: i32,
    pub prompt: String,
    pub options: Option<serde_json::Value>,
}

pub async fn get_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<PracticeQuestion>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "sessionId", "correctOption", "answeredCorrectly"
        FROM "practice_questions"
        WHERE "id" = $1
        LIMIT 1
        "#,
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| {
        Some(PracticeQuestion {
            id: r.try_get("id").ok()?,
            session_id: r.try_get("sessionId").ok()?,
            correct_option: r.try_get("correctOption").ok()?,
            answered_correctly: r.try_get("answeredCorrectly").ok().flatten(),
        })
    }))
}

/// Grades a question exactly once. The `"answeredCorrectly" IS NULL` guard
/// makes graded questions terminal even under concurrent submissions.
pub async fn grade_question(
    pool: &PgPool,
    question_id: &str,
    is_correct: bool,
    reward_points: i32,
    answered_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE "practice_questions"
        SET "answeredCorrectly" = $1, "answeredAt" = $2, "rewardPointsEarned" = $3
        WHERE "id" = $4 AND "answeredCorrectly" IS NULL
        "#,
    )
    .bind(is_correct)
    .bind(answered_at)
    .bind(reward_points)
    .bind(question_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomic in-place increments; concurrent submissions cannot lose updates.
pub async fn increment_session_counters(
    pool: &PgPool,
    session_id: &str,
    is_correct: bool,
    reward_points: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "practice_sessions"
        SET "totalQuestions" = "totalQuestions" + 1,
            "correctAnswers" = "correctAnswers" + $1,
            "rewardPoints" = "rewardPoints" + $2,
            "updatedAt" = $3
        WHERE "id" = $4
        "#,
    )
    .bind(if is_correct { 1 } else { 0 })
    .bind(reward_points)
    .bind(Utc::now())
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn next_unanswered_question(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<NextQuestion>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "position", "prompt", "options"
        FROM "practice_questions"
        WHERE "sessionId" = $1 AND "answeredCorrectly" IS NULL
        ORDER BY "position", "id"
        LIMIT 1
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| {
        Some(NextQuestion {
            id: r.try_get("id").ok()?,
            position: r.try_get("position").unwrap_or(0),
            prompt: r.try_get("prompt").unwrap_or_default(),
            options: r.try_get("options").ok().flatten(),
        })
    }))
}

/// Stored active -> completed transition once no unanswered question remains.
pub async fn complete_session(pool: &PgPool, session_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "practice_sessions"
        SET "status" = 'completed', "updatedAt" = $1
        WHERE "id" = $2 AND "status" = 'active'
        "#,
    )
    .bind(Utc::now())
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(())
}
