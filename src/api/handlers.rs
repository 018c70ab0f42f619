use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use crate::api::models::{
    BatchResult, HealthResponse, MetricsResponse, ServiceDescriptor, SingleResult,
};
use crate::api::validation::{decode_body, validate_analyze, validate_batch};
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::inference::preview;
use crate::status;

const LOG_PREVIEW_CHARS: usize = 50;

pub async fn home(State(state): State<Arc<AppState>>) -> Json<ServiceDescriptor> {
    Json(status::describe(&state))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(status::health(&state))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(status::metrics(&state))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SingleResult>, ApiError> {
    let orchestrator = state.model.orchestrator()?;
    let request = validate_analyze(decode_body(&body))?;
    let text_preview = preview(&request.text, LOG_PREVIEW_CHARS);

    let response = orchestrator.analyze(request.text).await.map_err(|err| {
        tracing::error!(error = %err, text = %text_preview, "Error in sentiment analysis");
        ApiError::from(err)
    })?;

    tracing::info!(
        "Analyzed text: '{}...' -> {} ({})",
        text_preview,
        response.result.sentiment,
        response.result.confidence
    );
    Ok(Json(response))
}

pub async fn batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BatchResult>, ApiError> {
    let orchestrator = state.model.orchestrator()?;
    let request = validate_batch(decode_body(&body))?;
    let first_preview = request
        .texts
        .first()
        .map(|text| preview(text, LOG_PREVIEW_CHARS))
        .unwrap_or_default();
    let size = request.texts.len();

    let response = orchestrator.analyze_batch(request.texts).await.map_err(|err| {
        tracing::error!(error = %err, size, first = %first_preview, "Error in batch analysis");
        ApiError::from(err)
    })?;

    tracing::info!(
        count = response.count,
        total_ms = response.total_inference_time_ms,
        "Analyzed batch"
    );
    Ok(Json(response))
}
