use chrono::Utc;
use sqlx::PgPool;

pub const EVENT_ADAPTIVE_ASSIGNMENT: &str = "adaptive_assignment";

pub async fn insert_engagement_event(
    pool: &PgPool,
    student_id: &str,
    event_type: &str,
    skill_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "student_engagement" ("id", "studentId", "eventType", "skillId", "createdAt")
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&id)
    .bind(student_id)
    .bind(event_type)
    .bind(skill_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
