//! Shared helpers for integration tests.

use std::sync::Arc;

use certforge::config::DatabaseConfig;
use certforge::services::CertificateService;
use certforge::storage::{create_pool, BackendSelector, DatabaseCertificateStore, DbPool};

/// Database configuration for a pool over `url` with the schema applied.
pub fn test_db_config(url: &str) -> DatabaseConfig {
    DatabaseConfig {
        url: url.to_string(),
        max_connections: 1,
        min_connections: 1,
        idle_timeout_seconds: 0,
        auto_migrate: true,
        ..Default::default()
    }
}

/// Pool over a single shared in-memory SQLite database.
pub async fn memory_pool() -> DbPool {
    create_pool(&test_db_config("sqlite://:memory:")).await.expect("in-memory sqlite pool")
}

/// Service routing to the in-memory fallback only (durable disconnected).
pub fn fallback_service() -> (CertificateService, Arc<BackendSelector>) {
    let selector = Arc::new(BackendSelector::new());
    (CertificateService::new(selector.clone()), selector)
}

/// Service with a durable store installed and active.
pub async fn durable_service() -> (CertificateService, Arc<BackendSelector>, DbPool) {
    let selector = Arc::new(BackendSelector::new());
    let pool = memory_pool().await;
    selector.install_durable(Arc::new(DatabaseCertificateStore::new(pool.clone())));

    (CertificateService::new(selector.clone()), selector, pool)
}
