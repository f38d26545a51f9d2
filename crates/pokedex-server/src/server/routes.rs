//! HTTP routes and handlers

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::{header, Uri},
    response::IntoResponse,
    Json,
};
use pokedex_classifier::{validate_upload, UploadLimits, ValidatedUpload};
use pokedex_core::UploadRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::telemetry::{INFERENCE_LATENCY_US, PREDICTIONS_TOTAL, REQUESTS_TOTAL};

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Body returned by a successful analysis
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

/// Classify the image in the `file` field of a multipart form
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);

    async move {
        metrics::counter!(REQUESTS_TOTAL).increment(1);

        let mut multipart = multipart?;
        let upload = read_upload(&mut multipart, &state.upload_limits()).await?;
        debug!(format = ?upload.format(), bytes = upload.len(), "Upload accepted");

        let prediction = state.pool.classify(upload).await?;

        metrics::counter!(PREDICTIONS_TOTAL, "label" => prediction.label.clone()).increment(1);
        metrics::histogram!(INFERENCE_LATENCY_US).record(prediction.latency_us as f64);
        info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            latency_us = prediction.latency_us,
            "Prediction complete"
        );

        Ok::<_, AppError>(Json(AnalyzeResponse {
            result: prediction.label,
        }))
    }
    .instrument(span)
    .await
}

/// Pull the image field out of the form and run it through validation
async fn read_upload(
    multipart: &mut Multipart,
    limits: &UploadLimits,
) -> Result<ValidatedUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(validate_upload(bytes, content_type.as_deref(), limits)?);
    }

    Err(UploadRejection::MissingField(FILE_FIELD.to_string()).into())
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.pool.classifier_name(),
        "labels": state.pool.labels().len(),
        "workers": state.pool.workers(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Label vocabulary in model output order
pub async fn labels(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pool.labels().clone())
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

pub async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
