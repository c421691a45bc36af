//! Cover letter generation: validates a session's inputs, builds the prompt and makes
//! exactly one call to the generation endpoint.
//!
//! Flow: begin_generation (validate, mark busy) → build_cover_letter_prompt →
//!       TextGenerator::generate → finish_generation (store result or error).

use std::sync::Arc;

use chrono::{DateTime, Local};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::build_cover_letter_prompt;
use crate::generation::style::StyleParameters;
use crate::llm_client::TextGenerator;
use crate::session::SessionStore;

/// Request body for a generate action. Texts left out fall back to what the session
/// already holds from earlier extractions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateLetterInput {
    pub job_description: Option<String>,
    pub original_letter: Option<String>,
    #[serde(default)]
    pub style: StyleParameters,
}

/// Everything one generation call needs. Built fresh per action and dropped once the
/// response is in.
#[derive(Debug)]
pub struct GenerationRequest {
    pub job_description: String,
    pub original_letter: String,
    pub style: StyleParameters,
    pub credential: SecretString,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLetter {
    pub text: String,
    pub generated_at: DateTime<Local>,
}

impl GeneratedLetter {
    pub fn generated_on_label(&self) -> String {
        format!(
            "Generated on {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// `Cover_Letter_<YYYYMMDD_HHMMSS>.txt`
pub fn download_filename(at: DateTime<Local>) -> String {
    format!("Cover_Letter_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Runs one generate action for a session.
///
/// Missing texts or a missing credential short-circuit before any external call.
/// The generation call runs on its own task so it completes and settles the session
/// even if the client disconnects.
pub async fn generate_cover_letter(
    sessions: &SessionStore,
    session_id: Uuid,
    generator: Arc<dyn TextGenerator>,
    input: GenerateLetterInput,
) -> Result<GeneratedLetter, AppError> {
    let request = sessions
        .with_session(session_id, |s| s.begin_generation(&input))
        .await??;

    let task_sessions = sessions.clone();
    let handle = tokio::spawn(async move {
        let outcome = run_generation(generator.as_ref(), &request).await;
        let settled = task_sessions
            .with_session(session_id, |s| s.finish_generation(&outcome))
            .await;
        if settled.is_err() {
            warn!("Session {session_id} ended while its letter was being generated");
        }
        outcome
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = AppError::Internal(anyhow::anyhow!("generation task failed: {e}"));
            Err(sessions.abandon_work(session_id, err).await)
        }
    }
}

/// Builds the prompt and calls the generator once. Any generator failure becomes
/// `AppError::Generation`.
pub async fn run_generation(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<GeneratedLetter, AppError> {
    let prompt = build_cover_letter_prompt(
        &request.job_description,
        &request.original_letter,
        &request.style,
    );
    info!(
        "Generating cover letter: tone={}, length={}, focus={}, prompt_chars={}",
        request.style.tone,
        request.style.length,
        request.style.focus,
        prompt.len()
    );

    let text = generator
        .generate(&prompt, &request.credential)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    info!("Cover letter generated ({} chars)", text.len());
    Ok(GeneratedLetter {
        text,
        generated_at: Local::now(),
    })
}
