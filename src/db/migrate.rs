use sqlx::PgPool;

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" SERIAL PRIMARY KEY,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TIMESTAMP NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Sqlx)?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await
            .map_err(MigrationError::Sqlx)?;

    let migrations = [(
        "001_init_schema",
        include_str!("../../sql/001_init_schema.sql"),
    )];

    for (name, sql) in migrations {
        if applied.iter().any(|m| m == name) {
            continue;
        }

        tracing::info!(migration = name, "Applying migration");

        for statement in split_statements(sql) {
            sqlx::query(&statement)
                .execute(pool)
                .await
                .map_err(|err| MigrationError::Failed {
                    name: name.to_string(),
                    source: err,
                })?;
        }

        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES ($1)"#)
            .bind(name)
            .execute(pool)
            .await
            .map_err(MigrationError::Sqlx)?;
    }

    tracing::info!("Database migrations complete");

    Ok(())
}

// Migration files hold plain DDL with no procedural blocks, so splitting on
// semicolons at end of statement is sufficient.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| {
            s.lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("database error: {0}")]
    Sqlx(#[source] sqlx::Error),
    #[error("migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::split_statements;

    #[test]
    fn splits_ddl_on_semicolons_and_drops_comments() {
        let sql = "-- header\nCREATE TABLE a (x INT);\n\n-- two\nCREATE INDEX b ON a (x);\n";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].starts_with("CREATE INDEX b"));
    }

    #[test]
    fn init_schema_parses_into_statements() {
        let statements = split_statements(include_str!("../../sql/001_init_schema.sql"));
        assert!(!statements.is_empty());
        assert!(statements
            .iter()
            .all(|s| s.starts_with("CREATE TABLE") || s.starts_with("CREATE INDEX") || s.starts_with("CREATE UNIQUE INDEX")));
    }
}
