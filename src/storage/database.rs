//! Durable certificate store backed by SQLite.
//!
//! Uniqueness of `reference_id` (primary key) and `email` (unique index) is
//! enforced by the schema; a unique-violation on insert surfaces as a
//! `Conflict` error, which callers treat as the authoritative signal to
//! retry-as-lookup.

use crate::domain::{CertificateRecord, CertificateType, ReferenceId};
use crate::errors::{CertforgeError, Result};
use crate::storage::{CertificateStore, DbPool};
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::instrument;

const CERTIFICATE_COLUMNS: &str =
    "reference_id, name, email, certificate_type, issued_at, downloaded, download_count";

/// Internal database row structure for certificates.
#[derive(Debug, Clone, FromRow)]
struct CertificateRow {
    pub reference_id: String,
    pub name: String,
    pub email: String,
    pub certificate_type: String,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub downloaded: bool,
    pub download_count: i64,
}

impl From<CertificateRow> for CertificateRecord {
    fn from(row: CertificateRow) -> Self {
        Self {
            reference_id: ReferenceId::from_string(row.reference_id),
            name: row.name,
            email: row.email,
            certificate_type: row
                .certificate_type
                .parse()
                .unwrap_or(CertificateType::Attended),
            issued_at: row.issued_at,
            downloaded: row.downloaded,
            download_count: row.download_count,
        }
    }
}

/// Durable certificate store over the SQLite connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseCertificateStore {
    pool: DbPool,
}

impl DatabaseCertificateStore {
    /// Creates a new store with the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Returns the database pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[async_trait]
impl CertificateStore for DatabaseCertificateStore {
    #[instrument(skip(self), fields(email = %email), name = "db_find_certificate_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<CertificateRecord>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {} FROM certificates WHERE email = $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, email = %email, "Failed to find certificate by email");
            CertforgeError::Database {
                source: e,
                context: "Failed to find certificate by email".to_string(),
            }
        })?;

        Ok(row.map(CertificateRecord::from))
    }

    #[instrument(skip(self), fields(reference_id = %id), name = "db_find_certificate_by_reference_id")]
    async fn find_by_reference_id(&self, id: &str) -> Result<Option<CertificateRecord>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {} FROM certificates WHERE reference_id = $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, reference_id = %id, "Failed to find certificate by reference id");
            CertforgeError::Database {
                source: e,
                context: format!("Failed to find certificate '{}'", id),
            }
        })?;

        Ok(row.map(CertificateRecord::from))
    }

    #[instrument(skip(self, record), fields(reference_id = %record.reference_id), name = "db_insert_certificate")]
    async fn insert(&self, record: &CertificateRecord) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO certificates (reference_id, name, email, certificate_type, issued_at, downloaded, download_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.reference_id.as_str())
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.certificate_type.as_str())
        .bind(record.issued_at)
        .bind(record.downloaded)
        .bind(record.download_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(reference_id = %record.reference_id, "Inserted certificate record");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(CertforgeError::conflict(
                format!("certificate '{}' already exists", record.reference_id),
                "certificate",
            )),
            Err(e) => {
                tracing::error!(error = %e, reference_id = %record.reference_id, "Failed to insert certificate");
                Err(CertforgeError::Database {
                    source: e,
                    context: format!("Failed to insert certificate '{}'", record.reference_id),
                })
            }
        }
    }

    #[instrument(skip(self), fields(reference_id = %id), name = "db_mark_certificate_downloaded")]
    async fn mark_downloaded(&self, id: &str) -> Result<CertificateRecord> {
        let result = sqlx::query(
            "UPDATE certificates SET downloaded = 1, download_count = download_count + 1 \
             WHERE reference_id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, reference_id = %id, "Failed to mark certificate downloaded");
            CertforgeError::Database {
                source: e,
                context: format!("Failed to mark certificate '{}' downloaded", id),
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(CertforgeError::not_found("certificate", id));
        }

        self.find_by_reference_id(id)
            .await?
            .ok_or_else(|| CertforgeError::not_found("certificate", id))
    }

    #[instrument(skip(self), name = "db_count_certificates")]
    async fn count_total(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM certificates")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CertforgeError::Database {
                source: e,
                context: "Failed to count certificates".to_string(),
            })?;

        Ok(count)
    }

    #[instrument(skip(self), name = "db_count_downloaded_certificates")]
    async fn count_downloaded(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM certificates WHERE downloaded = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| CertforgeError::Database {
                    source: e,
                    context: "Failed to count downloaded certificates".to_string(),
                })?;

        Ok(count)
    }

    #[instrument(skip(self), fields(limit = limit), name = "db_list_recent_certificates")]
    async fn list_recent(&self, limit: i64) -> Result<Vec<CertificateRecord>> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {} FROM certificates ORDER BY issued_at DESC LIMIT $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list recent certificates");
            CertforgeError::Database {
                source: e,
                context: "Failed to list recent certificates".to_string(),
            }
        })?;

        Ok(rows.into_iter().map(CertificateRecord::from).collect())
    }

    #[instrument(skip(self), name = "db_list_certificates")]
    async fn list_all(&self) -> Result<Vec<CertificateRecord>> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {} FROM certificates ORDER BY issued_at DESC",
            CERTIFICATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list certificates");
            CertforgeError::Database {
                source: e,
                context: "Failed to list certificates".to_string(),
            }
        })?;

        Ok(rows.into_iter().map(CertificateRecord::from).collect())
    }
}
