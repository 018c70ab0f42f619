use std::sync::Arc;

use crate::classifier::Classifier;
use crate::error::ApiError;
use crate::inference::InferenceOrchestrator;

/// Availability of the classifier, decided once at startup.
pub enum ModelState {
    Available(InferenceOrchestrator),
    Unavailable { reason: String },
}

impl ModelState {
    pub fn available(classifier: Arc<dyn Classifier>, max_concurrent: usize) -> Self {
        ModelState::Available(InferenceOrchestrator::new(classifier, max_concurrent))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelState::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Available(_))
    }

    pub fn orchestrator(&self) -> Result<&InferenceOrchestrator, ApiError> {
        match self {
            ModelState::Available(orchestrator) => Ok(orchestrator),
            ModelState::Unavailable { .. } => Err(ApiError::ModelUnavailable),
        }
    }
}

/// Static description of the loaded model, reported by `/metrics`.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub model: String,
    pub framework: String,
    pub runtime_version: String,
}

impl ModelInfo {
    pub fn for_model(model_id: &str) -> Self {
        Self {
            model: model_id.to_string(),
            framework: "candle".to_string(),
            runtime_version: env!("SENTIMENT_RUSTC_VERSION").to_string(),
        }
    }
}

pub struct AppState {
    pub model: ModelState,
    pub info: ModelInfo,
}

impl AppState {
    pub fn new(model: ModelState, info: ModelInfo) -> Self {
        if let ModelState::Unavailable { reason } = &model {
            tracing::warn!(%reason, "serving without a model; inference routes will fail");
        }
        Self { model, info }
    }
}
