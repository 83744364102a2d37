//! Failover behavior between the durable and in-memory stores.

mod common;

use std::sync::Arc;

use certforge::config::DatabaseConfig;
use certforge::errors::CertforgeError;
use certforge::services::CertificateService;
use certforge::storage::{
    Backend, BackendMonitor, BackendSelector, Connectivity, DatabaseCertificateStore,
};

#[tokio::test]
async fn requests_are_served_from_the_fallback_while_disconnected() {
    let (service, selector) = common::fallback_service();
    assert_eq!(selector.connectivity(), Connectivity::Disconnected);

    let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    assert!(outcome.created);

    // Retrievable via lookup while still disconnected.
    let record = service.get_for_download(outcome.record.reference_id.as_str()).await.unwrap();
    assert_eq!(record.download_count, 1);
}

#[tokio::test]
async fn reconnection_does_not_migrate_fallback_records() {
    let (service, selector) = common::fallback_service();

    // Created during the disconnected window.
    let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    let fallback_id = outcome.record.reference_id.as_str().to_string();

    // Durable backend comes up; switching back is a routing change only.
    let pool = common::memory_pool().await;
    selector.install_durable(Arc::new(DatabaseCertificateStore::new(pool)));
    assert_eq!(selector.active().backend, Backend::Durable);

    let err = service.get_for_download(&fallback_id).await.unwrap_err();
    assert!(matches!(err, CertforgeError::NotFound { .. }));

    // A new generation for the same email lands in the durable store as a
    // fresh record; the fallback record stays behind.
    let replay = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    assert!(replay.created);
    assert_ne!(replay.record.reference_id.as_str(), fallback_id);
}

#[tokio::test]
async fn durable_records_are_invisible_while_failed_over() {
    let (service, selector, _pool) = common::durable_service().await;

    let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    let durable_id = outcome.record.reference_id.as_str().to_string();

    selector.record_disconnect();

    let err = service.get_for_download(&durable_id).await.unwrap_err();
    assert!(matches!(err, CertforgeError::NotFound { .. }));

    // Visible again once durable routing resumes.
    assert!(selector.mark_connected());
    let record = service.get_for_download(&durable_id).await.unwrap();
    assert_eq!(record.download_count, 1);
}

#[tokio::test]
async fn call_time_backend_failure_flips_the_selector_and_serves_the_request() {
    let (service, selector, pool) = common::durable_service().await;

    pool.close().await;

    let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    assert!(outcome.created);
    assert_eq!(selector.connectivity(), Connectivity::Disconnected);
    assert_eq!(selector.active().backend, Backend::InMemory);
}

#[tokio::test]
async fn monitor_connects_and_fails_over_on_probe_failure() {
    let selector = Arc::new(BackendSelector::new());
    let monitor = BackendMonitor::new(selector.clone(), common::test_db_config("sqlite://:memory:"));

    // First probe installs the durable store.
    monitor.probe_once().await;
    assert_eq!(selector.connectivity(), Connectivity::Connected);

    let pool = selector.durable_store().unwrap().pool().clone();
    pool.close().await;

    // Next probe detects the outage and fails over.
    monitor.probe_once().await;
    assert_eq!(selector.connectivity(), Connectivity::Disconnected);
    assert_eq!(selector.active().backend, Backend::InMemory);
}

#[tokio::test]
async fn startup_with_unreachable_backend_stays_on_fallback() {
    let selector = Arc::new(BackendSelector::new());
    // A directory path is not a usable database file, so the connection
    // attempt fails.
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().display()),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_seconds: 1,
        auto_migrate: true,
        ..Default::default()
    };
    let monitor = BackendMonitor::new(selector.clone(), config);

    monitor.probe_once().await;

    assert_eq!(selector.connectivity(), Connectivity::Disconnected);

    let service = CertificateService::new(selector.clone());
    let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
    assert!(outcome.created);
}
