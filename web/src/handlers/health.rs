//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, http::StatusCode};
use inscriptions_runtime::{HealthReport, HealthStatus};
use serde::Serialize;

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving requests
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Simple health check endpoint (for basic liveness).
///
/// Does NOT check dependencies; see [`readiness_response`].
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn a dependency report into a readiness response.
///
/// - 200 OK: every check healthy
/// - 503 Service Unavailable: any check unhealthy
#[must_use]
pub fn readiness_response(report: HealthReport) -> (StatusCode, Json<HealthReport>) {
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(report))
}
