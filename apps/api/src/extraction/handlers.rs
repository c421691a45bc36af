//! Axum route handlers for filling a session's job description and cover letter from
//! URLs and uploaded files.

use std::future::Future;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::document::{extract_document, extract_pdf_letter};
use crate::extraction::{ExtractionError, ExtractionResult};
use crate::session::TextSlot;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractedTextResponse {
    pub target: TextSlot,
    pub chars: usize,
    pub text: String,
    pub message: String,
}

impl ExtractedTextResponse {
    fn new(target: TextSlot, text: String, message: String) -> Self {
        Self {
            target,
            chars: text.chars().count(),
            text,
            message,
        }
    }
}

struct Upload {
    filename: String,
    bytes: Bytes,
}

/// POST /api/v1/sessions/:id/job-description/url
pub async fn handle_scrape_job_description(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ExtractedTextResponse>, AppError> {
    let url = request.url.trim().to_string();
    if url.is_empty() {
        let err = AppError::Validation("Please enter a URL".to_string());
        return Err(reject(&state, session_id, err).await);
    }

    let scraper = state.scraper.clone();
    let text = run_extraction(&state, session_id, TextSlot::JobDescription, async move {
        scraper.scrape(&url).await
    })
    .await?;

    Ok(Json(ExtractedTextResponse::new(
        TextSlot::JobDescription,
        text,
        "Job description extracted successfully!".to_string(),
    )))
}

/// POST /api/v1/sessions/:id/job-description/upload
pub async fn handle_upload_job_description(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ExtractedTextResponse>, AppError> {
    upload_into(&state, session_id, TextSlot::JobDescription, multipart, extract_document).await
}

/// POST /api/v1/sessions/:id/cover-letter/upload
pub async fn handle_upload_cover_letter(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ExtractedTextResponse>, AppError> {
    upload_into(&state, session_id, TextSlot::CoverLetter, multipart, extract_document).await
}

/// POST /api/v1/sessions/:id/cover-letter/pdf
///
/// PDF-only letter extraction with the stricter length check.
pub async fn handle_upload_cover_letter_pdf(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ExtractedTextResponse>, AppError> {
    upload_into(&state, session_id, TextSlot::CoverLetter, multipart, extract_pdf_letter).await
}

async fn upload_into(
    state: &AppState,
    session_id: Uuid,
    slot: TextSlot,
    multipart: Multipart,
    extract: fn(&[u8], &str) -> ExtractionResult,
) -> Result<Json<ExtractedTextResponse>, AppError> {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return Err(reject(state, session_id, err).await),
    };
    info!(
        "Received upload '{}' ({} bytes) for session {session_id}",
        upload.filename,
        upload.bytes.len()
    );

    let filename = upload.filename.clone();
    let text = run_extraction(state, session_id, slot, async move {
        // PDF parsing is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || extract(&upload.bytes, &upload.filename))
            .await
            .unwrap_or_else(|e| Err(ExtractionError::Parse(format!("extraction task failed: {e}"))))
    })
    .await?;

    Ok(Json(ExtractedTextResponse::new(
        slot,
        text,
        format!("Successfully extracted text from {filename}"),
    )))
}

/// Returns the first multipart field that carries a filename.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;
        return Ok(Upload { filename, bytes });
    }
    Err(AppError::Validation("No file was uploaded".to_string()))
}

/// Records a failure that happened before any extraction work started. Unknown and
/// busy sessions answer with their own error instead.
async fn reject(state: &AppState, session_id: Uuid, err: AppError) -> AppError {
    match state
        .sessions
        .with_session(session_id, |s| s.record_failure(&err))
        .await
    {
        Ok(Ok(())) => err,
        Ok(Err(e)) | Err(e) => e,
    }
}

/// Marks the session busy, runs `work` to completion on its own task and records the
/// outcome in `slot`. The session settles even if the client goes away mid-request.
async fn run_extraction<F>(
    state: &AppState,
    session_id: Uuid,
    slot: TextSlot,
    work: F,
) -> Result<String, AppError>
where
    F: Future<Output = ExtractionResult> + Send + 'static,
{
    state
        .sessions
        .with_session(session_id, |s| s.begin_extraction())
        .await??;

    let sessions = state.sessions.clone();
    let handle = tokio::spawn(async move {
        let outcome = work.await.map_err(AppError::from);
        let settled = sessions
            .with_session(session_id, |s| s.finish_extraction(slot, &outcome))
            .await;
        if settled.is_err() {
            warn!("Session {session_id} ended during extraction");
        }
        outcome
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = AppError::Internal(anyhow::anyhow!("extraction task failed: {e}"));
            Err(state.sessions.abandon_work(session_id, err).await)
        }
    }
}
