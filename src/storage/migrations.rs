//! # Database Migration Management
//!
//! Forward-only schema migrations embedded in the binary and executed
//! automatically on pool creation when auto_migrate is enabled.

use crate::errors::{CertforgeError, Result};
use crate::storage::DbPool;
use sqlx::Row;
use tracing::info;

/// Embedded migrations, ordered by version.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "create_certificates",
    include_str!("../../migrations/0001_create_certificates.sql"),
)];

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    create_migration_table(pool).await?;

    let applied = applied_versions(pool).await?;

    let mut migrations_run = 0;
    for (version, description, sql) in MIGRATIONS {
        if applied.contains(version) {
            continue;
        }

        sqlx::raw_sql(sql).execute(pool).await.map_err(|e| CertforgeError::Database {
            source: e,
            context: format!("Failed to apply migration {} ({})", version, description),
        })?;

        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES ($1, $2)")
            .bind(version)
            .bind(description)
            .execute(pool)
            .await
            .map_err(|e| CertforgeError::Database {
                source: e,
                context: format!("Failed to record migration {}", version),
            })?;

        info!(version = version, description = description, "Applied migration");
        migrations_run += 1;
    }

    if migrations_run > 0 {
        info!(count = migrations_run, "Database migrations completed");
    }

    Ok(())
}

/// Get the highest applied migration version, if any
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    create_migration_table(pool).await?;

    let row = sqlx::query("SELECT MAX(version) AS version FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| CertforgeError::Database {
            source: e,
            context: "Failed to read migration version".to_string(),
        })?;

    Ok(row.get::<Option<i64>, _>("version"))
}

async fn create_migration_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            installed_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| CertforgeError::Database {
        source: e,
        context: "Failed to create schema_migrations table".to_string(),
    })?;

    Ok(())
}

async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .map_err(|e| CertforgeError::Database {
            source: e,
            context: "Failed to read applied migrations".to_string(),
        })?;

    Ok(rows.into_iter().map(|row| row.get::<i64, _>("version")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::create_pool;

    async fn bare_pool() -> DbPool {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: 0,
            auto_migrate: false,
            ..Default::default()
        };

        create_pool(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_run_migrations_creates_schema() {
        let pool = bare_pool().await;

        run_migrations(&pool).await.unwrap();

        // The certificates table exists and is queryable.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        assert_eq!(get_migration_version(&pool).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = bare_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(get_migration_version(&pool).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_migration_version_empty() {
        let pool = bare_pool().await;

        assert_eq!(get_migration_version(&pool).await.unwrap(), None);
    }
}
