use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct PendingNotification {
    pub id: String,
    pub org_id: String,
    pub user_id: String,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub async fn enqueue_notification(
    pool: &PgPool,
    org_id: &str,
    user_id: &str,
    notification_type: &str,
    title: &str,
    body: &str,
) -> Result<(), sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "notifications"
            ("id", "orgId", "userId", "notificationType", "title", "body", "status", "createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
        "#,
    )
    .bind(&id)
    .bind(org_id)
    .bind(user_id)
    .bind(notification_type)
    .bind(title)
    .bind(body)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_pending(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<PendingNotification>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "orgId", "userId", "notificationType", "title", "body", "createdAt"
        FROM "notifications"
        WHERE "status" = 'pending'
        ORDER BY "createdAt"
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            Some(PendingNotification {
                id: r.try_get("id").ok()?,
                org_id: r.try_get("orgId").ok()?,
                user_id: r.try_get("userId").ok()?,
                notification_type: r.try_get("notificationType").ok()?,
                title: r.try_get("title").unwrap_or_default(),
                body: r.try_get("body").unwrap_or_default(),
                created_at: r.try_get("createdAt").ok()?,
            })
        })
        .collect())
}

pub async fn mark_sent(pool: &PgPool, notification_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "notifications"
        SET "status" = 'sent', "sentAt" = $1
        WHERE "id" = $2
        "#,
    )
    .bind(Utc::now())
    .bind(notification_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_failed(pool: &PgPool, notification_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE "notifications" SET "status" = 'failed' WHERE "id" = $1"#)
        .bind(notification_id)
        .execute(pool)
        .await?;

    Ok(())
}
