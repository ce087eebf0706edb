use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{bridge, handlers, middleware::metrics_middleware, panel, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and coordinator status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route(
            "/test-mode",
            get(handlers::get_test_mode).put(handlers::set_test_mode),
        )
        // Control panel
        .route("/panel", post(panel::panel_command))
        .route("/ws", get(ws::ws_handler))
        // Browser extension
        .route("/bridge", get(bridge::bridge_handler))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
