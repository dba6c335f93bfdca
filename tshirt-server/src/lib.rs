//! # T-Shirt Studio Server Library
//!
//! HTTP surface for design export and seller submission.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tshirt_renderer::{ExportConfig, SceneExporter, SourceLoader};

pub mod config;
pub mod health;
pub mod mailer;
pub mod metrics;
pub mod routes;
pub mod validation;

pub use mailer::{DesignMailer, DesignMessage, LogMailer, MailError, MailSettings, OutboxMailer};

/// Largest accepted request body; designs arrive as base64 PNG data URIs.
pub const MAX_BODY_BYTES: usize = validation::MAX_DESIGN_IMAGE_LEN + 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Compositor used by `/api/export`.
    pub exporter: SceneExporter,
    /// Delivery of submissions.
    pub mailer: Arc<dyn DesignMailer>,
    /// Sender and seller addresses.
    pub mail: Arc<MailSettings>,
}

impl AppState {
    /// Create state from its parts.
    #[must_use]
    pub fn new(exporter: SceneExporter, mailer: Arc<dyn DesignMailer>, mail: MailSettings) -> Self {
        Self {
            exporter,
            mailer,
            mail: Arc::new(mail),
        }
    }
}

/// Exporter for scenes posted over HTTP.
///
/// Image sources are restricted to `data:` URIs so a client cannot make the
/// service read its own files or fetch from its network.
#[must_use]
pub fn web_exporter(config: ExportConfig) -> SceneExporter {
    SceneExporter::with_loader(config, Arc::new(SourceLoader::data_only()))
}

/// Build a CORS layer that only allows localhost origins.
#[must_use]
pub fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the application router: API routes, health probes and HTTP layers.
pub fn router(state: AppState, port: u16) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/send-design", post(routes::send_design))
        .route("/api/export", post(routes::export_design))
        .route("/api/upload", post(routes::upload_image))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Request ID for log correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(port))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
