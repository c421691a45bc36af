//! Axum route handlers for session lifecycle and credential storage.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::SessionView;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Deserialize)]
pub struct SaveCredentialRequest {
    pub api_key: Secret<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    info!(
        "Session {session_id} started ({} active)",
        state.sessions.len().await
    );
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(session_id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.end(session_id).await?;
    info!("Session {session_id} ended");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/credential
///
/// Stores the user's API key for later generations. The key is not validated here;
/// a bad key surfaces as a generation error.
pub async fn handle_save_credential(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SaveCredentialRequest>,
) -> Result<Json<StatusMessage>, AppError> {
    state
        .sessions
        .with_session(session_id, |s| {
            s.save_credential(request.api_key.expose_secret())
        })
        .await??;

    info!("API key saved for session {session_id}");
    Ok(Json(StatusMessage {
        message: "API key saved successfully!".to_string(),
    }))
}
