//! Session routes: start a cooking session, send messages, inspect and end it.
//!
//! Every handler is a thin shim over [`souschef_core::Kitchen`]; error kinds map to
//! 404 / 400 / 500 with a `{ "status": "error", "error": ... }` body.

use crate::AppState;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use souschef_core::{
    ErrorKind, SessionListing, SessionStart, SessionStatus, SousChefError, TurnReport,
};

pub(crate) struct ApiError(SousChefError);

impl From<SousChefError> for ApiError {
    fn from(err: SousChefError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => {
                tracing::error!(target: "souschef::gateway", error = %self.0, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "status": "error", "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[derive(serde::Deserialize)]
pub(crate) struct StartRequest {
    recipe_key: String,
}

#[derive(serde::Deserialize)]
pub(crate) struct MessageRequest {
    message: String,
}

/// POST /session/start
pub(crate) async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<axum::Json<SessionStart>, ApiError> {
    Ok(axum::Json(state.kitchen.start_session(&req.recipe_key)?))
}

/// POST /session/:id/message
pub(crate) async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<axum::Json<TurnReport>, ApiError> {
    let report = state.kitchen.send_message(&session_id, &req.message).await?;
    Ok(axum::Json(report))
}

/// GET /session/:id
pub(crate) async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<axum::Json<SessionStatus>, ApiError> {
    Ok(axum::Json(state.kitchen.session_status(&session_id)?))
}

/// DELETE /session/:id
pub(crate) async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<axum::Json<serde_json::Value>, ApiError> {
    state.kitchen.end_session(&session_id)?;
    Ok(axum::Json(serde_json::json!({ "message": "Session deleted" })))
}

/// GET /sessions
pub(crate) async fn list_sessions(
    State(state): State<AppState>,
) -> Result<axum::Json<Vec<SessionListing>>, ApiError> {
    Ok(axum::Json(state.kitchen.list_sessions()?))
}
