pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::generation::handlers as generation;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:id/credential",
            put(session::handle_save_credential),
        )
        // Inputs
        .route(
            "/api/v1/sessions/:id/job-description/url",
            post(extraction::handle_scrape_job_description),
        )
        .route(
            "/api/v1/sessions/:id/job-description/upload",
            post(extraction::handle_upload_job_description),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter/upload",
            post(extraction::handle_upload_cover_letter),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter/pdf",
            post(extraction::handle_upload_cover_letter_pdf),
        )
        // Generation
        .route(
            "/api/v1/sessions/:id/generate",
            post(generation::handle_generate),
        )
        .route("/api/v1/sessions/:id/letter", get(generation::handle_get_letter))
        .route(
            "/api/v1/sessions/:id/letter/download",
            get(generation::handle_download_letter),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
