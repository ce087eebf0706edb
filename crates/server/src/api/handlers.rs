use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use lottohunt_core::{CoordinatorStatus, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub bridge_connected: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        bridge_connected: state.bridge().is_connected().await,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<CoordinatorStatus> {
    Json(state.coordinator().status().await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TestModeBody {
    pub enabled: bool,
}

pub async fn get_test_mode(State(state): State<Arc<AppState>>) -> Response {
    match state.coordinator().store().test_mode() {
        Ok(enabled) => Json(TestModeBody { enabled }).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn set_test_mode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TestModeBody>,
) -> Response {
    match state.coordinator().store().set_test_mode(body.enabled) {
        Ok(()) => {
            tracing::info!(enabled = body.enabled, "Test mode updated");
            Json(body).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
