//! Certificate issuance business logic.
//!
//! Every public operation pins the active backend once at entry and uses
//! that pinned reference throughout. When an operation against a pinned
//! durable store fails with a database-level error, the failure is
//! delivered to the selector as a disconnect event and the operation is
//! re-run once against the in-memory fallback, so callers see a served
//! request instead of a backend outage.

use crate::domain::CertificateRecord;
use crate::errors::{CertforgeError, Result};
use crate::services::ReferenceIdGenerator;
use crate::storage::{ActiveStore, Backend, BackendSelector, CertificateStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of records returned in the stats `recent` listing.
pub const RECENT_LIMIT: i64 = 10;

/// Bounded insert retries after a uniqueness conflict.
const MAX_INSERT_ATTEMPTS: usize = 3;

/// Result of a generation request.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// False when the email already had a certificate (idempotent replay)
    pub created: bool,
    pub record: CertificateRecord,
}

/// Aggregate statistics over the active store.
#[derive(Debug, Clone)]
pub struct CertificateStats {
    pub total: i64,
    pub downloaded: i64,
    pub pending: i64,
    pub recent: Vec<CertificateRecord>,
}

/// Service orchestrating generation, download and statistics over the
/// currently active record store.
pub struct CertificateService {
    backends: Arc<BackendSelector>,
    reference_ids: ReferenceIdGenerator,
}

impl CertificateService {
    pub fn new(backends: Arc<BackendSelector>) -> Self {
        Self { backends, reference_ids: ReferenceIdGenerator::new() }
    }

    /// Generate a certificate for `(name, email)`, or return the existing
    /// record when the normalized email already has one.
    pub async fn generate(&self, name: &str, email: &str) -> Result<GenerateOutcome> {
        let name = name.trim().to_string();
        let email = email.trim().to_lowercase();

        // Validation failures never reach a store.
        if name.is_empty() {
            return Err(CertforgeError::validation_field("name must not be empty", "name"));
        }
        if !validator::ValidateEmail::validate_email(&email) {
            return Err(CertforgeError::validation_field(
                format!("'{}' is not a valid email address", email),
                "email",
            ));
        }

        let active = self.backends.active();
        match self.generate_on(active.store.as_ref(), &name, &email).await {
            Err(e) if self.should_fail_over(&active, &e) => {
                let fallback = self.fail_over(&active, &e);
                self.generate_on(fallback.as_ref(), &name, &email).await
            }
            result => result,
        }
    }

    /// Fetch a certificate for download, marking it downloaded and
    /// incrementing its counter. A record created in the other backend is
    /// not visible here; that is the documented failover limitation.
    pub async fn get_for_download(&self, reference_id: &str) -> Result<CertificateRecord> {
        let reference_id = reference_id.trim();

        let active = self.backends.active();
        match self.download_on(active.store.as_ref(), reference_id).await {
            Err(e) if self.should_fail_over(&active, &e) => {
                let fallback = self.fail_over(&active, &e);
                self.download_on(fallback.as_ref(), reference_id).await
            }
            result => result,
        }
    }

    /// Aggregate counts plus the most recent issuances.
    pub async fn stats(&self) -> Result<CertificateStats> {
        let active = self.backends.active();
        match self.stats_on(active.store.as_ref()).await {
            Err(e) if self.should_fail_over(&active, &e) => {
                let fallback = self.fail_over(&active, &e);
                self.stats_on(fallback.as_ref()).await
            }
            result => result,
        }
    }

    /// All records in the active store, newest first.
    pub async fn list_all(&self) -> Result<Vec<CertificateRecord>> {
        let active = self.backends.active();
        match active.store.list_all().await {
            Err(e) if self.should_fail_over(&active, &e) => {
                let fallback = self.fail_over(&active, &e);
                fallback.list_all().await
            }
            result => result,
        }
    }

    fn should_fail_over(&self, active: &ActiveStore, error: &CertforgeError) -> bool {
        active.backend == Backend::Durable && error.is_backend_unavailable()
    }

    /// Report the disconnect to the selector and hand back the fallback
    /// store for the retry.
    fn fail_over(
        &self,
        active: &ActiveStore,
        error: &CertforgeError,
    ) -> Arc<crate::storage::InMemoryCertificateStore> {
        warn!(
            backend = active.backend.as_str(),
            error = %error,
            "Durable backend failed mid-operation, failing over to in-memory store"
        );
        self.backends.record_disconnect();
        self.backends.memory_store()
    }

    async fn generate_on(
        &self,
        store: &dyn CertificateStore,
        name: &str,
        email: &str,
    ) -> Result<GenerateOutcome> {
        if let Some(existing) = store.find_by_email(email).await? {
            debug!(
                reference_id = %existing.reference_id,
                "Generation request for known email, returning existing record"
            );
            return Ok(GenerateOutcome { created: false, record: existing });
        }

        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let reference_id = self.reference_ids.next_unused(store).await?;
            let record =
                CertificateRecord::new(reference_id, name.to_string(), email.to_string());

            match store.insert(&record).await {
                Ok(()) => {
                    info!(reference_id = %record.reference_id, "Issued new certificate");
                    return Ok(GenerateOutcome { created: true, record });
                }
                Err(e) if e.is_conflict() => {
                    // A concurrent generation won the insert; the store's
                    // uniqueness check is authoritative. Resolve by email
                    // first, otherwise the collision was on the id.
                    if let Some(existing) = store.find_by_email(email).await? {
                        debug!(
                            reference_id = %existing.reference_id,
                            "Lost generation race, returning the surviving record"
                        );
                        return Ok(GenerateOutcome { created: false, record: existing });
                    }

                    warn!(attempt, "Reference id conflict on insert, drawing a new id");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CertforgeError::conflict(
            format!("could not insert certificate after {} attempts", MAX_INSERT_ATTEMPTS),
            "certificate",
        ))
    }

    async fn download_on(
        &self,
        store: &dyn CertificateStore,
        reference_id: &str,
    ) -> Result<CertificateRecord> {
        let record = store.mark_downloaded(reference_id).await?;

        info!(
            reference_id = %record.reference_id,
            download_count = record.download_count,
            "Certificate downloaded"
        );

        Ok(record)
    }

    async fn stats_on(&self, store: &dyn CertificateStore) -> Result<CertificateStats> {
        let total = store.count_total().await?;
        let downloaded = store.count_downloaded().await?;
        let recent = store.list_recent(RECENT_LIMIT).await?;

        Ok(CertificateStats { total, downloaded, pending: total - downloaded, recent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::memory_pool;
    use crate::storage::DatabaseCertificateStore;

    fn memory_service() -> (CertificateService, Arc<BackendSelector>) {
        let selector = Arc::new(BackendSelector::new());
        (CertificateService::new(selector.clone()), selector)
    }

    #[tokio::test]
    async fn test_generate_normalizes_inputs() {
        let (service, _) = memory_service();

        let outcome = service.generate("Ada Lovelace", "ADA@Example.com ").await.unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.record.name, "Ada Lovelace");
        assert_eq!(outcome.record.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_generate_is_idempotent_per_email() {
        let (service, _) = memory_service();

        let first = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
        let second = service.generate("Ada Lovelace", " ADA@EXAMPLE.COM").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record.reference_id, second.record.reference_id);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_name() {
        let (service, _) = memory_service();

        let err = service.generate("", "x@y.com").await.unwrap_err();
        assert!(matches!(err, CertforgeError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_email() {
        let (service, _) = memory_service();

        let err = service.generate("Bob", "not-an-email").await.unwrap_err();
        assert!(matches!(err, CertforgeError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_download_counts_every_call() {
        let (service, _) = memory_service();
        let outcome = service.generate("Ada Lovelace", "ada@example.com").await.unwrap();
        let id = outcome.record.reference_id.as_str().to_string();

        for expected in 1..=3 {
            let record = service.get_for_download(&id).await.unwrap();
            assert!(record.downloaded);
            assert_eq!(record.download_count, expected);
        }
    }

    #[tokio::test]
    async fn test_download_unknown_id_is_not_found() {
        let (service, _) = memory_service();

        let err = service.get_for_download("CSAC2025-ZZZZZ").await.unwrap_err();
        assert!(matches!(err, CertforgeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stats_counts_and_recent() {
        let (service, _) = memory_service();

        service.generate("Ada", "ada@example.com").await.unwrap();
        let bob = service.generate("Bob", "bob@example.com").await.unwrap();
        service.get_for_download(bob.record.reference_id.as_str()).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.recent.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_generation_creates_one_record() {
        let (service, _) = memory_service();
        let service = Arc::new(service);

        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.generate("Ada", "ada@example.com").await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.generate("Ada", "ada@example.com").await })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert_eq!(
            [first.created, second.created].iter().filter(|created| **created).count(),
            1
        );
        assert_eq!(first.record.reference_id, second.record.reference_id);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_call_time_failure_fails_over_to_memory() {
        let selector = Arc::new(BackendSelector::new());
        let pool = memory_pool().await;
        selector.install_durable(Arc::new(DatabaseCertificateStore::new(pool.clone())));
        let service = CertificateService::new(selector.clone());

        // Simulate the durable backend dropping between probes.
        pool.close().await;

        let outcome = service.generate("Ada", "ada@example.com").await.unwrap();
        assert!(outcome.created);
        assert_eq!(selector.connectivity(), crate::storage::Connectivity::Disconnected);

        // Served from the fallback while still disconnected.
        let record =
            service.get_for_download(outcome.record.reference_id.as_str()).await.unwrap();
        assert_eq!(record.download_count, 1);
    }
}
