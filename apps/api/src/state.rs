use std::sync::Arc;

use crate::config::Config;
use crate::extraction::scraper::JobPostingScraper;
use crate::llm_client::TextGenerator;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub scraper: JobPostingScraper,
    /// Pluggable generation backend. Default: `LlmClient` against the Gemini API.
    pub generator: Arc<dyn TextGenerator>,
}
