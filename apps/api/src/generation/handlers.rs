//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{
    download_filename, generate_cover_letter, GenerateLetterInput, GeneratedLetter,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LetterResponse {
    pub text: String,
    pub generated_at: DateTime<Local>,
    /// Display line, e.g. "Generated on 2024-05-01 14:03:22".
    pub generated_on: String,
}

impl From<GeneratedLetter> for LetterResponse {
    fn from(letter: GeneratedLetter) -> Self {
        Self {
            generated_on: letter.generated_on_label(),
            text: letter.text,
            generated_at: letter.generated_at,
        }
    }
}

/// POST /api/v1/sessions/:id/generate
///
/// Validates inputs, calls the generation endpoint once and returns the tailored letter.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(input): Json<GenerateLetterInput>,
) -> Result<Json<LetterResponse>, AppError> {
    let letter =
        generate_cover_letter(&state.sessions, session_id, state.generator.clone(), input).await?;
    Ok(Json(letter.into()))
}

/// GET /api/v1/sessions/:id/letter
///
/// Returns the last generated letter, for display or copying.
pub async fn handle_get_letter(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<LetterResponse>, AppError> {
    let letter = last_letter(&state, session_id).await?;
    Ok(Json(letter.into()))
}

/// GET /api/v1/sessions/:id/letter/download
///
/// Serves the raw letter text as `Cover_Letter_<YYYYMMDD_HHMMSS>.txt`.
pub async fn handle_download_letter(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let letter = last_letter(&state, session_id).await?;
    let filename = download_filename(Local::now());

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        letter.text,
    ))
}

async fn last_letter(state: &AppState, session_id: Uuid) -> Result<GeneratedLetter, AppError> {
    state
        .sessions
        .with_session(session_id, |s| s.last_letter().cloned())
        .await?
        .ok_or_else(|| AppError::NotFound("No cover letter has been generated yet".to_string()))
}
