//! API route handlers.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tshirt_core::{CanvasError, Scene};
use tshirt_renderer::{upload_data_uri, RenderError, DOWNLOAD_FILE_NAME};

use crate::mailer::{DesignMessage, MailError};
use crate::metrics;
use crate::validation::{validate_scene, SendDesignRequest, ValidationError};
use crate::AppState;

/// Message returned to the client when delivery fails.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send design. Please try again.";

/// Message returned to the client on successful delivery.
pub const SEND_OK_MESSAGE: &str = "Design sent successfully!";

/// Handler failures, each mapped to a status code and a JSON `error` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The body could not be parsed.
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    /// The mailer could not deliver the submission.
    #[error(transparent)]
    Mail(#[from] MailError),
    /// The compositor failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<CanvasError> for ApiError {
    fn from(err: CanvasError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(_) | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Mail(_) => (StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED_MESSAGE.to_string()),
            Self::Render(RenderError::Resource(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export design".to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `POST /api/send-design`: validate a submission and deliver it to the seller.
#[tracing::instrument(name = "send_design", skip(state, payload))]
pub async fn send_design(
    State(state): State<AppState>,
    payload: Result<Json<SendDesignRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload.inspect_err(|_| metrics::record_submission("invalid"))?;
    let valid = request.validate().inspect_err(|e| {
        metrics::record_validation_failure(e.kind());
        metrics::record_submission("invalid");
    })?;

    let message = DesignMessage::compose(&state.mail, &valid.submission, valid.png);
    state.mailer.send(&message).await.inspect_err(|e| {
        tracing::error!("Email sending error: {e}");
        metrics::record_submission("failed");
    })?;

    metrics::record_submission("sent");
    tracing::info!(
        "Design submission from {} delivered to {}",
        valid.submission.user_details.name,
        message.to
    );
    Ok(Json(json!({ "success": true, "message": SEND_OK_MESSAGE })))
}

/// `POST /api/export`: flatten a scene JSON body to a downloadable PNG.
#[tracing::instrument(name = "export_design", skip(state, body), fields(bytes = body.len()))]
pub async fn export_design(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, ApiError> {
    let scene = Scene::from_json(&body)?;
    validate_scene(&scene, state.exporter.config())
        .inspect_err(|e| metrics::record_validation_failure(e.kind()))?;

    let started = Instant::now();
    let prepared = state.exporter.prepare(&scene).await?;
    let skipped = prepared.skipped_images();
    let artifact = tokio::task::spawn_blocking(move || prepared.rasterize())
        .await
        .map_err(|e| RenderError::Export(format!("Rasterization task failed: {e}")))?;
    metrics::record_export(artifact.is_ok(), started.elapsed().as_secs_f64(), skipped);
    let artifact = artifact?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        artifact.png,
    )
        .into_response())
}

/// `POST /api/upload`: turn raw image bytes into a data URI for an image element.
#[tracing::instrument(name = "upload_image", skip(body), fields(bytes = body.len()))]
pub async fn upload_image(body: Bytes) -> Result<Json<serde_json::Value>, ApiError> {
    let src = upload_data_uri(&body)?;
    Ok(Json(json!({ "src": src })))
}
