//! Inference service status.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClassifierStatusResponse {
    pub classifier: String,
    pub url: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check the inference service. Always 200; reachability is in the body.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ClassifierStatusResponse> {
    let classifier = state.classifier();
    let mut response = ClassifierStatusResponse {
        classifier: classifier.name().to_string(),
        url: state.config().classifier.url.clone(),
        reachable: false,
        status: None,
        latency_ms: None,
        error: None,
    };

    match classifier.health().await {
        Ok(health) => {
            response.reachable = true;
            response.status = Some(health.status);
            response.latency_ms = Some(health.latency_ms);
        }
        Err(e) => {
            tracing::warn!("Classifier health check failed: {}", e);
            response.error = Some(e.to_string());
        }
    }

    Json(response)
}
