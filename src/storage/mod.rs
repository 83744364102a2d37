//! # Storage and Persistence
//!
//! Record store contract and its two implementations: a durable SQLite
//! store and an in-memory fallback. Both expose identical observable
//! behavior for identical inputs; the in-memory variant loses all data on
//! process restart, which is an accepted limitation of the failover design.

pub mod database;
pub mod failover;
pub mod memory;
pub mod migrations;
pub mod pool;

pub use crate::config::DatabaseConfig;

use crate::domain::CertificateRecord;
use crate::errors::{CertforgeError, Result};
use async_trait::async_trait;

pub use database::DatabaseCertificateStore;
pub use failover::{ActiveStore, Backend, BackendMonitor, BackendSelector, Connectivity};
pub use memory::InMemoryCertificateStore;
pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool};

/// Contract shared by the durable and in-memory certificate stores.
///
/// `insert` fails with a `Conflict` error when the reference id or email is
/// already present; that insert-time check is the authoritative uniqueness
/// enforcement, the find operations are only optimizations ahead of it.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Look up a record by its normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<CertificateRecord>>;

    /// Look up a record by its reference id.
    async fn find_by_reference_id(&self, id: &str) -> Result<Option<CertificateRecord>>;

    /// Persist a new record. Fails with `Conflict` if the reference id or
    /// email already exists.
    async fn insert(&self, record: &CertificateRecord) -> Result<()>;

    /// Mark a record downloaded and increment its download counter in one
    /// atomic step, returning the mutated record. Fails with `NotFound` if
    /// the id is absent.
    async fn mark_downloaded(&self, id: &str) -> Result<CertificateRecord>;

    /// Total number of records.
    async fn count_total(&self) -> Result<i64>;

    /// Number of records downloaded at least once.
    async fn count_downloaded(&self) -> Result<i64>;

    /// Up to `limit` records, newest issuance first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<CertificateRecord>>;

    /// All records, newest issuance first.
    async fn list_all(&self) -> Result<Vec<CertificateRecord>>;
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        CertforgeError::backend_unavailable(format!("Database connectivity check failed: {}", e))
    })?;

    Ok(())
}
