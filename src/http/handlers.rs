use super::state::AppState;
use crate::completion::CompletionSummary;
use crate::error::SessionError;
use crate::prompt::CallRequest;
use crate::session::PipelineConfig;
use crate::transport::ConnectionInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(flatten)]
    pub call: CallRequest,

    /// Provider and transport choices (defaults when omitted)
    #[serde(default)]
    pub pipeline_config: Option<PipelineConfig>,

    /// Prompt template; `{{placeholders}}` are filled from the call fields
    pub system_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub connection: ConnectionInfo,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveSessionsResponse {
    pub count: usize,
    pub session_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::UnsupportedProvider { .. } | SessionError::UnsupportedTransport(_) => {
            StatusCode::BAD_REQUEST
        }
        SessionError::DuplicateSession(_) | SessionError::NotActive(_) => StatusCode::CONFLICT,
        SessionError::Provisioning(_) => StatusCode::BAD_GATEWAY,
        SessionError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Start a new call session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    info!("Starting session for call: {}", req.call.call_id);

    let config = req.pipeline_config.unwrap_or_default();

    match state
        .orchestrator
        .start(req.call, config, &req.system_prompt)
        .await
    {
        Ok(started) => (
            StatusCode::OK,
            Json(StartSessionResponse {
                session_id: started.session_id,
                connection: started.connection,
                status: started.status,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start session: {}", e);
            error_response(status_for(&e), format!("Failed to start session: {}", e))
        }
    }
}

/// POST /sessions/:session_id/end
/// End a session and return its summary
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.orchestrator.end(&session_id).await {
        Some(summary) => (StatusCode::OK, Json::<CompletionSummary>(summary)).into_response(),
        None => {
            warn!("End requested for unknown session {}", session_id);
            error_response(
                StatusCode::NOT_FOUND,
                format!("Session {} not found", session_id),
            )
        }
    }
}

/// GET /sessions
/// List active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let session_ids = state.orchestrator.active_session_ids().await;
    Json(ActiveSessionsResponse {
        count: session_ids.len(),
        session_ids,
    })
}

/// GET /sessions/:session_id
/// Status of an active or completed session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.orchestrator.status(&session_id).await {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
