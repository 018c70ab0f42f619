use std::collections::BTreeMap;

use serde::Serialize;

/// Validated single-text request. `text` is kept exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Validated batch request, at most [`crate::api::validation::MAX_BATCH_SIZE`] texts.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleResult {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub inference_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub results: Vec<ClassificationResult>,
    pub count: usize,
    pub total_inference_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
    ModelLoadFailed,
}

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub version: &'static str,
    pub status: ServiceStatus,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub model_loaded: bool,
    pub timestamp: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub model: String,
    pub framework: String,
    pub runtime_version: String,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
