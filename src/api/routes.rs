use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::CertificateService;
use crate::storage::BackendSelector;

use super::handlers::{
    certificate_stats_handler, download_certificate_handler, generate_certificate_handler,
    health_handler, list_certificates_handler,
};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<CertificateService>,
    pub backends: Arc<BackendSelector>,
}

pub fn build_router(state: ApiState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %uuid::Uuid::new_v4(),
        )
    });

    Router::new()
        .route(
            "/api/certificates",
            post(generate_certificate_handler).get(list_certificates_handler),
        )
        .route("/api/certificates/download", get(download_certificate_handler))
        .route("/api/certificates/stats", get(certificate_stats_handler))
        .route("/health", get(health_handler))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
