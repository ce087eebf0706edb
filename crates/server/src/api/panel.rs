//! Command endpoint for the control panel.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use lottohunt_core::{CoordinatorError, PanelCommand};

use crate::metrics::PANEL_COMMAND_ERRORS;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(err: &CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::InvalidCriteria(_) => StatusCode::BAD_REQUEST,
        CoordinatorError::AlreadyRunning(_) => StatusCode::CONFLICT,
        CoordinatorError::Executor(_) | CoordinatorError::Tab(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Dispatch one panel command to the coordinator.
pub async fn panel_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<PanelCommand>,
) -> Response {
    let name = command.name();
    debug!(command = name, "Panel command");

    match state.coordinator().handle_command(command).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            let status = error_status(&e);
            PANEL_COMMAND_ERRORS
                .with_label_values(&[name, status.as_str()])
                .inc();
            warn!(command = name, status = status.as_u16(), error = %e, "Panel command failed");
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottohunt_core::{CriteriaError, ExecutorError, StoreError, TabError, TabId};

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&CoordinatorError::InvalidCriteria(CriteriaError::NoSearchNumbers)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&CoordinatorError::AlreadyRunning(TabId(1))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&CoordinatorError::Executor(ExecutorError::Transport(
                "gone".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&CoordinatorError::Tab(TabError::NotFound(TabId(2)))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&CoordinatorError::Store(StoreError::Database("locked".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
