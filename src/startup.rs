//! Application wiring: selector, health monitor, service and router.

use std::sync::Arc;

use axum::Router;

use crate::api::{build_router, ApiState};
use crate::config::AppConfig;
use crate::services::CertificateService;
use crate::storage::{BackendMonitor, BackendSelector};

/// Wired application components.
pub struct Application {
    pub router: Router,
    pub backends: Arc<BackendSelector>,
}

/// Build the application from configuration.
///
/// The selector starts on the in-memory fallback; the spawned monitor makes
/// the first durable connection attempt off the request path, so startup
/// never blocks on an unreachable backend.
pub fn build_application(config: &AppConfig) -> Application {
    let backends = Arc::new(BackendSelector::new());

    BackendMonitor::new(backends.clone(), config.database.clone()).spawn();

    let service = Arc::new(CertificateService::new(backends.clone()));
    let router = build_router(ApiState { service, backends: backends.clone() });

    Application { router, backends }
}
