//! Prometheus metrics for tshirt-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const SUBMISSIONS_TOTAL: &str = "tshirt_submissions_total";
const EXPORTS_TOTAL: &str = "tshirt_exports_total";
const EXPORT_DURATION: &str = "tshirt_export_duration_seconds";
const SKIPPED_IMAGES_TOTAL: &str = "tshirt_export_skipped_images_total";
const VALIDATION_FAILURES_TOTAL: &str = "tshirt_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record the outcome of a design submission.
///
/// # Arguments
///
/// * `outcome` - "sent", "invalid" or "failed"
pub fn record_submission(outcome: &'static str) {
    counter!(SUBMISSIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a finished export.
pub fn record_export(success: bool, duration_secs: f64, skipped_images: usize) {
    counter!(EXPORTS_TOTAL, "success" => success.to_string()).increment(1);
    histogram!(EXPORT_DURATION).record(duration_secs);
    counter!(SKIPPED_IMAGES_TOTAL).increment(u64::try_from(skipped_images).unwrap_or(u64::MAX));
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `kind` - Which check failed (missing_fields, field, design_image, scene)
pub fn record_validation_failure(kind: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "type" => kind).increment(1);
}
