use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub id: String,
    pub org_id: String,
    pub requested_by: String,
    pub status: String,
    pub request_type: String,
    pub grade: String,
    pub subject: String,
    pub skill: String,
    pub difficulty: String,
    pub language: String,
    pub prompt: Option<String>,
    pub preferred_provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContentCacheEntry {
    pub cache_key: String,
    pub content: serde_json::Value,
    pub provider_used: String,
    pub generated_at: DateTime<Utc>,
    pub ttl_seconds: i64,
}

impl ContentCacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.generated_at).num_seconds();
        age >= 0 && age <= self.ttl_seconds
    }
}

#[derive(Debug, Clone)]
pub struct NewContentRequest<'a> {
    pub org_id: &'a str,
    pub requested_by: &'a str,
    pub request_type: &'a str,
    pub grade: &'a str,
    pub subject: &'a str,
    pub skill: &'a str,
    pub difficulty: &'a str,
    pub language: &'a str,
    pub prompt: Option<&'a str>,
    pub preferred_provider: Option<&'a str>,
}

/// Composite identity used to deduplicate generated content.
pub fn cache_key(
    grade: &str,
    subject: &str,
    skill: &str,
    difficulty: &str,
    request_type: &str,
    language: &str,
) -> String {
    [grade, subject, skill, difficulty, request_type, language]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
}

/// Inserts a queued request unless one is already queued for the same
/// (student, skill). Returns whether a row was actually created.
pub async fn enqueue_request(
    pool: &PgPool,
    request: &NewContentRequest<'_>,
) -> Result<bool, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO "content_requests"
            ("id", "orgId", "requestedBy", "status", "requestType", "grade", "subject",
             "skill", "difficulty", "language", "prompt", "preferredProvider", "createdAt", "updatedAt")
        VALUES ($1, $2, $3, 'queued', $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        ON CONFLICT ("requestedBy", "skill") WHERE "status" = 'queued'
        DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(request.org_id)
    .bind(request.requested_by)
    .bind(request.request_type)
    .bind(request.grade)
    .bind(request.subject)
    .bind(request.skill)
    .bind(request.difficulty)
    .bind(request.language)
    .bind(request.prompt)
    .bind(request.preferred_provider)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Oldest queued requests first, bounded batch.
pub async fn fetch_queued(pool: &PgPool, limit: i64) -> Result<Vec<ContentRequest>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "orgId", "requestedBy", "status", "requestType", "grade", "subject",
               "skill", "difficulty", "language", "prompt", "preferredProvider", "createdAt"
        FROM "content_requests"
        WHERE "status" = 'queued'
        ORDER BY "createdAt"
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().filter_map(map_request).collect())
}

/// Statuses only move forward; a row that already left `queued` is untouched.
pub async fn mark_request_status(
    pool: &PgPool,
    request_id: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "content_requests"
        SET "status" = $1, "updatedAt" = $2
        WHERE "id" = $3 AND "status" = 'queued'
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(request_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_cache_entry(
    pool: &PgPool,
    key: &str,
) -> Result<Option<ContentCacheEntry>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "cacheKey", "content", "providerUsed", "generatedAt", "ttlSeconds"
        FROM "content_cache"
        WHERE "cacheKey" = $1
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| {
        Some(ContentCacheEntry {
            cache_key: r.try_get("cacheKey").ok()?,
            content: r.try_get("content").ok()?,
            provider_used: r.try_get("providerUsed").ok()?,
            generated_at: r.try_get("generatedAt").ok()?,
            ttl_seconds: r.try_get("ttlSeconds").ok()?,
        })
    }))
}

pub async fn upsert_cache_entry(
    pool: &PgPool,
    key: &str,
    content: &serde_json::Value,
    provider_used: &str,
    ttl_seconds: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "content_cache" ("cacheKey", "content", "providerUsed", "generatedAt", "ttlSeconds")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("cacheKey")
        DO UPDATE SET
            "content" = EXCLUDED."content",
            "providerUsed" = EXCLUDED."providerUsed",
            "generatedAt" = EXCLUDED."generatedAt",
            "ttlSeconds" = EXCLUDED."ttlSeconds"
        "#,
    )
    .bind(key)
    .bind(content)
    .bind(provider_used)
    .bind(Utc::now())
    .bind(ttl_seconds)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_content_item(
    pool: &PgPool,
    request: &ContentRequest,
    payload: &serde_json::Value,
    provider_used: &str,
    cached_from: bool,
) -> Result<String, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "content_items"
            ("id", "orgId", "requestId", "contentType", "grade", "subject", "skill",
             "difficulty", "language", "payload", "providerUsed", "cachedFrom", "createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(&id)
    .bind(&request.org_id)
    .bind(&request.id)
    .bind(&request.request_type)
    .bind(&request.grade)
    .bind(&request.subject)
    .bind(&request.skill)
    .bind(&request.difficulty)
    .bind(&request.language)
    .bind(payload)
    .bind(provider_used)
    .bind(cached_from)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

fn map_request(row: &sqlx::postgres::PgRow) -> Option<ContentRequest> {
    Some(ContentRequest {
        id: row.try_get("id").ok()?,
        org_id: row.try_get("orgId").ok()?,
        requested_by: row.try_get("requestedBy").ok()?,
        status: row.try_get("status").ok()?,
        request_type: row.try_get("requestType").ok()?,
        grade: row.try_get("grade").ok()?,
        subject: row.try_get("subject").ok()?,
        skill: row.try_get("skill").ok()?,
        difficulty: row.try_get("difficulty").ok()?,
        language: row.try_get("language").ok()?,
        prompt: row.try_get("prompt").ok().flatten(),
        preferred_provider: row.try_get("preferredProvider").ok().flatten(),
        created_at: row.try_get("createdAt").ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cache_key_is_normalized_composite() {
        let key = cache_key("9", "Math", "Fractions", "Hard", "quiz", "en");
        assert_eq!(key, "9|math|fractions|hard|quiz|en");

        let padded = cache_key(" 9 ", "MATH", " fractions", "hard ", "Quiz", "EN");
        assert_eq!(padded, key);
    }

    #[test]
    fn cache_entry_freshness_respects_ttl() {
        let entry = ContentCacheEntry {
            cache_key: "k".into(),
            content: serde_json::json!({}),
            provider_used: "fast".into(),
            generated_at: Utc::now() - Duration::days(8),
            ttl_seconds: 604_800,
        };
        assert!(!entry.is_fresh(Utc::now()));

        let fresh = ContentCacheEntry {
            generated_at: Utc::now() - Duration::days(3),
            ..entry
        };
        assert!(fresh.is_fresh(Utc::now()));
    }
}
