//! Session state: the explicit, in-memory replacement for per-browser stores.
//!
//! A session holds the saved credential, the latest job description and cover letter
//! texts, the last generated letter and the view state. Sessions live until ended
//! explicitly or left idle past the store's TTL; nothing is persisted.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{GenerateLetterInput, GeneratedLetter, GenerationRequest};

/// What the user is looking at. Transitions are driven by discrete actions:
///
/// ```text
/// Idle | ResultShown | ErrorShown --generate--> Validating
/// Validating --missing text/credential--> ErrorShown
/// Validating --> Generating --> ResultShown | ErrorShown
/// Idle | ResultShown | ErrorShown --extract--> Extracting --> Idle | ErrorShown
/// ```
///
/// `Validating`, `Generating` and `Extracting` are busy states: any further action
/// that would start work is rejected until the running one settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Idle,
    Extracting,
    Validating,
    Generating,
    ResultShown,
    ErrorShown {
        code: String,
        message: String,
    },
}

impl ViewState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ViewState::Extracting | ViewState::Validating | ViewState::Generating
        )
    }

    fn failed(err: &AppError) -> Self {
        ViewState::ErrorShown {
            code: err.code().to_string(),
            message: err.user_message(),
        }
    }
}

/// Which input an extraction fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSlot {
    JobDescription,
    CoverLetter,
}

#[derive(Debug)]
pub struct Session {
    created_at: DateTime<Utc>,
    last_active: Instant,
    credential: Option<SecretString>,
    job_description: Option<String>,
    cover_letter: Option<String>,
    last_letter: Option<GeneratedLetter>,
    view: ViewState,
}

impl Session {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_active: Instant::now(),
            credential: None,
            job_description: None,
            cover_letter: None,
            last_letter: None,
            view: ViewState::Idle,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn last_letter(&self) -> Option<&GeneratedLetter> {
        self.last_letter.as_ref()
    }

    pub fn text(&self, slot: TextSlot) -> Option<&str> {
        match slot {
            TextSlot::JobDescription => self.job_description.as_deref(),
            TextSlot::CoverLetter => self.cover_letter.as_deref(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn save_credential(&mut self, api_key: &str) -> Result<(), AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Validation("Please enter an API key".to_string()));
        }
        self.credential = Some(SecretString::new(api_key.to_string()));
        Ok(())
    }

    fn ensure_not_busy(&self) -> Result<(), AppError> {
        if self.view.is_busy() {
            return Err(AppError::ActionInProgress);
        }
        Ok(())
    }

    /// Shows `err` for an action that failed before any work started. A running action
    /// keeps its state and the caller gets `ActionInProgress` instead.
    pub fn record_failure(&mut self, err: &AppError) -> Result<(), AppError> {
        self.ensure_not_busy()?;
        self.view = ViewState::failed(err);
        Ok(())
    }

    /// Leaves a busy state whose work died without settling.
    pub fn abandon_work(&mut self, err: &AppError) {
        if self.view.is_busy() {
            self.view = ViewState::failed(err);
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        !self.view.is_busy() && now.saturating_duration_since(self.last_active) > ttl
    }

    pub fn begin_extraction(&mut self) -> Result<(), AppError> {
        self.ensure_not_busy()?;
        self.view = ViewState::Extracting;
        Ok(())
    }

    /// Stores extracted text in `slot`, or records the failure. A failed extraction
    /// leaves the previous text in place.
    pub fn finish_extraction(&mut self, slot: TextSlot, outcome: &Result<String, AppError>) {
        match outcome {
            Ok(text) => {
                self.set_text(slot, text.clone());
                self.view = ViewState::Idle;
            }
            Err(e) => self.view = ViewState::failed(e),
        }
    }

    fn set_text(&mut self, slot: TextSlot, text: String) {
        match slot {
            TextSlot::JobDescription => self.job_description = Some(text),
            TextSlot::CoverLetter => self.cover_letter = Some(text),
        }
    }

    /// Validates the inputs for a generation and, when they are complete, moves to
    /// `Generating` and returns a fresh request. Typed texts replace the stored ones.
    pub fn begin_generation(
        &mut self,
        input: &GenerateLetterInput,
    ) -> Result<GenerationRequest, AppError> {
        self.ensure_not_busy()?;
        self.view = ViewState::Validating;

        if let Some(text) = &input.job_description {
            self.job_description = Some(text.clone());
        }
        if let Some(text) = &input.original_letter {
            self.cover_letter = Some(text.clone());
        }

        let job_description = non_blank(self.job_description.as_deref()).map(str::to_string);
        let original_letter = non_blank(self.cover_letter.as_deref()).map(str::to_string);
        let (Some(job_description), Some(original_letter)) = (job_description, original_letter)
        else {
            return Err(self.fail(AppError::MissingInput(
                "Please provide both a job description and your original cover letter."
                    .to_string(),
            )));
        };

        let credential = self
            .credential
            .as_ref()
            .map(|c| SecretString::new(c.expose_secret().clone()));
        let Some(credential) = credential else {
            return Err(self.fail(AppError::MissingCredential));
        };

        self.view = ViewState::Generating;
        Ok(GenerationRequest {
            job_description,
            original_letter,
            style: input.style,
            credential,
        })
    }

    pub fn finish_generation(&mut self, outcome: &Result<GeneratedLetter, AppError>) {
        match outcome {
            Ok(letter) => {
                self.last_letter = Some(letter.clone());
                self.view = ViewState::ResultShown;
            }
            Err(e) => self.view = ViewState::failed(e),
        }
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.view = ViewState::failed(&err);
        err
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Read-only projection of a session returned to clients. Never includes the credential.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub view: ViewState,
    pub has_credential: bool,
    pub job_description: Option<String>,
    pub cover_letter: Option<String>,
    pub has_letter: bool,
}

/// Idle time after which a session is dropped, unless a busy action holds it.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// All live sessions. Cloning shares the same map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.inner.write().await;
        self.sweep_expired(&mut sessions);
        sessions.insert(id, Session::new());
        id
    }

    fn sweep_expired(&self, sessions: &mut HashMap<Uuid, Session>) {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.idle_ttl));
        let dropped = before - sessions.len();
        if dropped > 0 {
            info!("Dropped {dropped} idle sessions");
        }
    }

    /// Ends a session, dropping its credential and texts.
    pub async fn end(&self, id: Uuid) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    /// Runs `f` against the session under the store lock. The lock is released before
    /// this returns, so `f` must not do I/O.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.inner.write().await;
        self.sweep_expired(&mut sessions);
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.last_active = Instant::now();
        Ok(f(session))
    }

    /// Settles a session whose action task died before finishing, and hands `err`
    /// back for the response.
    pub async fn abandon_work(&self, id: Uuid, err: AppError) -> AppError {
        if self.with_session(id, |s| s.abandon_work(&err)).await.is_err() {
            tracing::warn!("Session {id} ended before its failed action could settle");
        }
        err
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.inner.read().await;
        let session = sessions
            .get(&id)
            .filter(|s| !s.is_expired(Instant::now(), self.idle_ttl))
            .ok_or_else(|| not_found(id))?;
        Ok(SessionView {
            session_id: id,
            created_at: session.created_at,
            view: session.view().clone(),
            has_credential: session.has_credential(),
            job_description: session.text(TextSlot::JobDescription).map(String::from),
            cover_letter: session.text(TextSlot::CoverLetter).map(String::from),
            has_letter: session.last_letter().is_some(),
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
