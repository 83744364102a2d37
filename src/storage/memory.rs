//! In-memory certificate store used while the durable backend is down.
//!
//! All data is lost on process restart; that is the accepted cost of
//! staying available through a durable-backend outage. The scan-then-append
//! inside `insert` runs under a single mutex guard with no await point, so
//! it emulates the durable store's uniqueness constraint even when requests
//! interleave.

use crate::domain::CertificateRecord;
use crate::errors::{CertforgeError, Result};
use crate::storage::CertificateStore;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Transient certificate store holding records in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    records: Mutex<Vec<CertificateRecord>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<CertificateRecord>>> {
        self.records
            .lock()
            .map_err(|_| CertforgeError::internal("in-memory certificate store mutex poisoned"))
    }

    fn sorted_newest_first(records: &[CertificateRecord]) -> Vec<CertificateRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        sorted
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CertificateRecord>> {
        let records = self.guard()?;
        Ok(records.iter().find(|r| r.email == email).cloned())
    }

    async fn find_by_reference_id(&self, id: &str) -> Result<Option<CertificateRecord>> {
        let records = self.guard()?;
        Ok(records.iter().find(|r| r.reference_id.as_str() == id).cloned())
    }

    async fn insert(&self, record: &CertificateRecord) -> Result<()> {
        // Existence scan and append under one guard; no suspension between.
        let mut records = self.guard()?;

        if records.iter().any(|r| r.reference_id == record.reference_id) {
            return Err(CertforgeError::conflict(
                format!("certificate '{}' already exists", record.reference_id),
                "certificate",
            ));
        }

        if records.iter().any(|r| r.email == record.email) {
            return Err(CertforgeError::conflict(
                format!("certificate for '{}' already exists", record.email),
                "certificate",
            ));
        }

        records.push(record.clone());
        tracing::info!(reference_id = %record.reference_id, "Inserted certificate record into in-memory store");
        Ok(())
    }

    async fn mark_downloaded(&self, id: &str) -> Result<CertificateRecord> {
        let mut records = self.guard()?;

        let record = records
            .iter_mut()
            .find(|r| r.reference_id.as_str() == id)
            .ok_or_else(|| CertforgeError::not_found("certificate", id))?;

        record.downloaded = true;
        record.download_count += 1;
        Ok(record.clone())
    }

    async fn count_total(&self) -> Result<i64> {
        let records = self.guard()?;
        Ok(records.len() as i64)
    }

    async fn count_downloaded(&self) -> Result<i64> {
        let records = self.guard()?;
        Ok(records.iter().filter(|r| r.downloaded).count() as i64)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<CertificateRecord>> {
        let records = self.guard()?;
        let mut sorted = Self::sorted_newest_first(&records);
        sorted.truncate(limit.max(0) as usize);
        Ok(sorted)
    }

    async fn list_all(&self) -> Result<Vec<CertificateRecord>> {
        let records = self.guard()?;
        Ok(Self::sorted_newest_first(&records))
    }
}
