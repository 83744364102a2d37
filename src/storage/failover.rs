//! Backend health monitoring and failover routing.
//!
//! `BackendSelector` holds the always-available in-memory store and, once a
//! connection succeeds, the durable store. A single atomic flag is the
//! commit point for which backend serves new operations: the durable store
//! is published before the flag flips, so readers never observe a
//! half-installed selector. The `BackendMonitor` background task is the
//! writer of record for the flag; service operations that hit a database
//! error deliver that disconnect event through `record_disconnect`.
//!
//! Records are never replayed between backends on a transition. Switching
//! is a pure routing change, so data written during a disconnected window
//! stays in the in-memory store only (and vice versa).

use crate::config::DatabaseConfig;
use crate::storage::{
    check_connection, create_pool, CertificateStore, DatabaseCertificateStore,
    InMemoryCertificateStore,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Connectivity state of the durable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// String form used by the health endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Connected => "connected",
            Connectivity::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend a pinned store reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Durable,
    InMemory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Durable => "durable",
            Backend::InMemory => "in-memory",
        }
    }
}

/// Store reference pinned at operation entry. A logical operation uses this
/// one reference throughout, so a failover mid-operation never splits it
/// across backends.
#[derive(Clone)]
pub struct ActiveStore {
    pub store: Arc<dyn CertificateStore>,
    pub backend: Backend,
}

/// Selector for the backend serving new operations.
pub struct BackendSelector {
    memory: Arc<InMemoryCertificateStore>,
    durable: RwLock<Option<Arc<DatabaseCertificateStore>>>,
    connected: AtomicBool,
}

impl BackendSelector {
    /// Create a selector routing to the in-memory store (fail-open: the
    /// durable store joins once the first connection attempt succeeds).
    pub fn new() -> Self {
        Self {
            memory: Arc::new(InMemoryCertificateStore::new()),
            durable: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// The in-memory fallback store.
    pub fn memory_store(&self) -> Arc<InMemoryCertificateStore> {
        self.memory.clone()
    }

    /// The durable store, if one has ever been installed.
    pub fn durable_store(&self) -> Option<Arc<DatabaseCertificateStore>> {
        match self.durable.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Pin the currently active store for one logical operation.
    pub fn active(&self) -> ActiveStore {
        if self.connected.load(Ordering::SeqCst) {
            if let Some(durable) = self.durable_store() {
                return ActiveStore { store: durable, backend: Backend::Durable };
            }
        }

        ActiveStore { store: self.memory.clone(), backend: Backend::InMemory }
    }

    /// Current durable-backend connectivity.
    pub fn connectivity(&self) -> Connectivity {
        if self.connected.load(Ordering::SeqCst) {
            Connectivity::Connected
        } else {
            Connectivity::Disconnected
        }
    }

    /// Publish a durable store and route new operations to it. The store is
    /// installed before the connected flag flips; the flag is the commit
    /// point readers observe.
    pub fn install_durable(&self, store: Arc<DatabaseCertificateStore>) {
        {
            let mut slot = match self.durable.write() {
                Ok(slot) => slot,
                Err(poisoned) => poisoned.into_inner(),
            };
            *slot = Some(store);
        }
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Resume durable routing over the already-installed store. Returns
    /// false if no durable store has been installed yet.
    pub fn mark_connected(&self) -> bool {
        if self.durable_store().is_some() {
            self.connected.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Route new operations to the in-memory fallback. The durable store
    /// stays installed so reconnection can reuse its pool.
    pub fn record_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task probing durable-backend connectivity and driving the
/// selector's CONNECTED/DISCONNECTED transitions.
pub struct BackendMonitor {
    selector: Arc<BackendSelector>,
    config: DatabaseConfig,
}

impl BackendMonitor {
    pub fn new(selector: Arc<BackendSelector>, config: DatabaseConfig) -> Self {
        Self { selector, config }
    }

    /// Spawn the monitor loop. The first connection attempt happens inside
    /// the task, so a slow or unreachable durable backend never blocks
    /// startup; requests run against the fallback until it succeeds.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.probe_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.probe_once().await;
            }
        })
    }

    /// One probe cycle: ping when connected, attempt (re)connection when
    /// disconnected.
    pub async fn probe_once(&self) {
        match self.selector.connectivity() {
            Connectivity::Connected => self.probe_connected().await,
            Connectivity::Disconnected => self.try_reconnect().await,
        }
    }

    async fn probe_connected(&self) {
        let Some(store) = self.selector.durable_store() else {
            self.selector.record_disconnect();
            return;
        };

        if let Err(e) = check_connection(store.pool()).await {
            warn!(error = %e, "Durable backend probe failed, failing over to in-memory store");
            self.selector.record_disconnect();
        }
    }

    async fn try_reconnect(&self) {
        // Reuse the existing pool across reconnects; sqlx re-establishes
        // connections on demand once the backend is reachable again.
        if let Some(store) = self.selector.durable_store() {
            match check_connection(store.pool()).await {
                Ok(()) => {
                    if self.selector.mark_connected() {
                        info!("Durable backend reachable again, resuming durable routing");
                    }
                }
                Err(e) => debug!(error = %e, "Durable backend still unreachable"),
            }
            return;
        }

        match create_pool(&self.config).await {
            Ok(pool) => {
                self.selector.install_durable(Arc::new(DatabaseCertificateStore::new(pool)));
                info!("Connected to durable backend");
            }
            Err(e) => {
                warn!(error = %e, "Durable backend connection attempt failed, continuing on in-memory store");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::memory_pool;

    #[tokio::test]
    async fn test_selector_starts_disconnected_on_memory() {
        let selector = BackendSelector::new();

        assert_eq!(selector.connectivity(), Connectivity::Disconnected);
        assert_eq!(selector.active().backend, Backend::InMemory);
        assert!(selector.durable_store().is_none());
        assert!(!selector.mark_connected());
    }

    #[tokio::test]
    async fn test_install_durable_switches_routing() {
        let selector = BackendSelector::new();
        let durable = Arc::new(DatabaseCertificateStore::new(memory_pool().await));

        selector.install_durable(durable);

        assert_eq!(selector.connectivity(), Connectivity::Connected);
        assert_eq!(selector.active().backend, Backend::Durable);
    }

    #[tokio::test]
    async fn test_disconnect_and_reconnect_are_routing_changes_only() {
        let selector = BackendSelector::new();
        selector.install_durable(Arc::new(DatabaseCertificateStore::new(memory_pool().await)));

        selector.record_disconnect();
        assert_eq!(selector.connectivity(), Connectivity::Disconnected);
        assert_eq!(selector.active().backend, Backend::InMemory);
        // The durable store stays installed for pool reuse.
        assert!(selector.durable_store().is_some());

        assert!(selector.mark_connected());
        assert_eq!(selector.active().backend, Backend::Durable);
    }

    #[tokio::test]
    async fn test_monitor_installs_durable_store_on_first_probe() {
        let selector = Arc::new(BackendSelector::new());
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: 0,
            auto_migrate: true,
            ..Default::default()
        };
        let monitor = BackendMonitor::new(selector.clone(), config);

        monitor.probe_once().await;

        assert_eq!(selector.connectivity(), Connectivity::Connected);
        assert_eq!(selector.active().backend, Backend::Durable);
    }

    #[tokio::test]
    async fn test_monitor_fails_over_when_probe_fails() {
        let selector = Arc::new(BackendSelector::new());
        let pool = memory_pool().await;
        selector.install_durable(Arc::new(DatabaseCertificateStore::new(pool.clone())));

        let config = DatabaseConfig::default();
        let monitor = BackendMonitor::new(selector.clone(), config);

        // Healthy probe keeps durable routing.
        monitor.probe_once().await;
        assert_eq!(selector.connectivity(), Connectivity::Connected);

        // A closed pool makes the probe fail and flips the selector.
        pool.close().await;
        monitor.probe_once().await;
        assert_eq!(selector.connectivity(), Connectivity::Disconnected);
        assert_eq!(selector.active().backend, Backend::InMemory);
    }
}
