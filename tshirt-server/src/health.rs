//! Health check endpoints for container probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)
//! - `/health` - Combined check, same as readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Mailer can accept submissions
    pub mailer: bool,
    /// Export output size is usable
    pub exporter: bool,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - can the server accept submissions and exports?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mailer_ok = state.mailer.ready().await;
    let exporter_ok = state.exporter.config().size.map_or(true, |size| size > 0);
    let all_ok = mailer_ok && exporter_ok;

    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            mailer: mailer_ok,
            exporter: exporter_ok,
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "unhealthy",
            version: "0.1.0",
            checks: HealthChecks {
                mailer: false,
                exporter: true,
            },
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["checks"]["mailer"], false);
        assert_eq!(json["checks"]["exporter"], true);
    }
}
