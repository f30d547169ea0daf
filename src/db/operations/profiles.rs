use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: String,
    pub org_id: String,
    pub grade: Option<String>,
}

pub async fn list_students(pool: &PgPool) -> Result<Vec<StudentProfile>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "orgId", "grade"
        FROM "profiles"
        WHERE "role" = 'student'
        ORDER BY "createdAt"
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let id: Option<String> = r.try_get("id").ok();
            let org_id: Option<String> = r.try_get("orgId").ok();
            match (id, org_id) {
                (Some(id), Some(org_id)) => Some(StudentProfile {
                    id,
                    org_id,
                    grade: r.try_get("grade").ok().flatten(),
                }),
                _ => None,
            }
        })
        .collect())
}

pub async fn list_org_students(pool: &PgPool, org_id: &str) -> Result<Vec<StudentProfile>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "orgId", "grade"
        FROM "profiles"
        WHERE "role" = 'student' AND "orgId" = $1
        ORDER BY "createdAt"
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let id: Option<String> = r.try_get("id").ok();
            id.map(|id| StudentProfile {
                id,
                org_id: org_id.to_string(),
                grade: r.try_get("grade").ok().flatten(),
            })
        })
        .collect())
}

pub async fn list_org_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT DISTINCT "orgId" FROM "profiles" WHERE "role" = 'student' ORDER BY "orgId""#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(|r| r.try_get("orgId").ok()).collect())
}
