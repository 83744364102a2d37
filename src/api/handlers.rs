//! Request handlers for the certificate API.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::domain::CertificateRecord;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    success: bool,
    existing: bool,
    reference_id: String,
    name: String,
    email: String,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub reference_id: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    success: bool,
    reference_id: String,
    name: String,
    email: String,
    certificate_type: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct CertificateSummary {
    reference_id: String,
    name: String,
    email: String,
    certificate_type: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    downloaded: bool,
    download_count: i64,
}

impl From<CertificateRecord> for CertificateSummary {
    fn from(record: CertificateRecord) -> Self {
        Self {
            reference_id: record.reference_id.into_string(),
            name: record.name,
            email: record.email,
            certificate_type: record.certificate_type.to_string(),
            timestamp: record.issued_at,
            downloaded: record.downloaded,
            download_count: record.download_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    total: i64,
    downloaded: i64,
    pending: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    success: bool,
    stats: StatsBody,
    recent: Vec<CertificateSummary>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    success: bool,
    count: usize,
    certificates: Vec<CertificateSummary>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    backend_connectivity: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// POST /api/certificates
pub async fn generate_certificate_handler(
    State(state): State<ApiState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let outcome = state.service.generate(&request.name, &request.email).await?;

    let message = if outcome.created {
        "Certificate generated".to_string()
    } else {
        "Certificate already exists for this email".to_string()
    };

    Ok(Json(GenerateResponse {
        success: true,
        existing: !outcome.created,
        reference_id: outcome.record.reference_id.into_string(),
        name: outcome.record.name,
        email: outcome.record.email,
        message,
    }))
}

/// GET /api/certificates/download?reference_id=CSAC2026-XXXXX
pub async fn download_certificate_handler(
    State(state): State<ApiState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let record = state.service.get_for_download(&query.reference_id).await?;

    Ok(Json(DownloadResponse {
        success: true,
        reference_id: record.reference_id.into_string(),
        name: record.name,
        email: record.email,
        certificate_type: record.certificate_type.to_string(),
        timestamp: record.issued_at,
    }))
}

/// GET /api/certificates/stats
pub async fn certificate_stats_handler(
    State(state): State<ApiState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.service.stats().await?;

    Ok(Json(StatsResponse {
        success: true,
        stats: StatsBody {
            total: stats.total,
            downloaded: stats.downloaded,
            pending: stats.pending,
        },
        recent: stats.recent.into_iter().map(CertificateSummary::from).collect(),
    }))
}

/// GET /api/certificates
pub async fn list_certificates_handler(
    State(state): State<ApiState>,
) -> Result<Json<ListResponse>, ApiError> {
    let records = state.service.list_all().await?;

    Ok(Json(ListResponse {
        success: true,
        count: records.len(),
        certificates: records.into_iter().map(CertificateSummary::from).collect(),
    }))
}

/// GET /health
pub async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend_connectivity: state.backends.connectivity().as_str(),
        timestamp: chrono::Utc::now(),
    })
}
