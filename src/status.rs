//! Liveness, health and descriptive snapshots of the service.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::api::models::{HealthResponse, MetricsResponse, ServiceDescriptor, ServiceStatus};
use crate::app_state::AppState;

pub const SERVICE_NAME: &str = "Sentiment Analysis API";
pub const SERVICE_VERSION: &str = "v1.0";

pub fn describe(state: &AppState) -> ServiceDescriptor {
    let status = if state.model.is_loaded() {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::ModelLoadFailed
    };

    ServiceDescriptor {
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        status,
        endpoints: endpoints(),
    }
}

/// The timestamp is the only field that changes between calls.
pub fn health(state: &AppState) -> HealthResponse {
    let model_loaded = state.model.is_loaded();
    HealthResponse {
        status: if model_loaded {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        },
        model_loaded,
        timestamp: epoch_seconds(),
    }
}

pub fn metrics(state: &AppState) -> MetricsResponse {
    MetricsResponse {
        model: state.info.model.clone(),
        framework: state.info.framework.clone(),
        runtime_version: state.info.runtime_version.clone(),
        model_loaded: state.model.is_loaded(),
    }
}

fn endpoints() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("/analyze", "POST - Analyze sentiment of text"),
        ("/batch", "POST - Analyze multiple texts"),
        ("/health", "GET - Health check"),
        ("/metrics", "GET - Basic metrics"),
    ])
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
