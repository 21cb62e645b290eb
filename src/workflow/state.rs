//! Application state for the client and its pure transitions.
//!
//! [`AppState`] is the single source of truth for what the interface shows:
//! form fields, the current configuration, the explanation, indicators and
//! the loading/error phase. Action availability is derived from it rather
//! than stored, so it cannot drift out of sync.
//!
//! Remote operations are split into a `start_*` half (local validation, enter
//! loading, issue a [`RequestTicket`]) and a `finish_*` half (apply the
//! outcome if the ticket is still current, exit loading). A ticket goes stale
//! when `clear()` runs or a newer request starts; stale finishes are
//! discarded without touching the state.

use std::time::{Duration, Instant};

use crate::error::{RemoteError, WorkflowError};
use crate::service::{ExplainRequest, GenerateRequest};
use crate::validator::{self, DisplayJson, JsonValidation};

/// How long the copy control shows its confirmation.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

pub const COPY_LABEL: &str = "Copy";
pub const COPY_CONFIRMED_LABEL: &str = "✓ Copied!";
pub const OUTPUT_PLACEHOLDER: &str = "Your generated JSON will appear here...";

/// Overall phase of the interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Ready { has_configuration: bool },
}

/// Seed-field validity indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidityIndicator {
    #[default]
    Neutral,
    ValidSeed,
    InvalidSeed(String),
    ConfigurationGenerated,
}

impl ValidityIndicator {
    fn for_seed(seed: &str) -> Self {
        match validator::validate(seed) {
            JsonValidation::Empty => Self::Neutral,
            JsonValidation::Valid { .. } => Self::ValidSeed,
            JsonValidation::Invalid { detail } => Self::InvalidSeed(detail),
        }
    }

    /// Indicator text; empty when neutral.
    pub fn message(&self) -> String {
        match self {
            Self::Neutral => String::new(),
            Self::ValidSeed => "✓ Valid JSON".to_string(),
            Self::InvalidSeed(detail) => format!("✗ Invalid JSON: {detail}"),
            Self::ConfigurationGenerated => "✓ Valid JSON Configuration Generated".to_string(),
        }
    }
}

/// File upload indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadIndicator {
    #[default]
    None,
    Loaded(String),
    Rejected(String),
}

impl UploadIndicator {
    pub fn message(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Loaded(name) => format!("✓ {name}"),
            Self::Rejected(name) => format!("✗ {name} (invalid)"),
        }
    }
}

/// Which remote operation a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Generate,
    Explain,
}

/// Proof that a request was started against a particular state epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a started request must be finished to leave the loading state"]
pub struct RequestTicket {
    epoch: u64,
    kind: RequestKind,
    issued_at: Instant,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Milliseconds since the request was started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.issued_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Whether a finished request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The state moved on (cleared or superseded); the outcome was dropped.
    Stale,
}

/// Actions the user can currently trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actions {
    pub generate: bool,
    pub explain: bool,
    pub copy: bool,
}

/// Everything the interface displays.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub description: String,
    pub seed: String,
    configuration: Option<String>,
    explanation: Option<String>,
    loading: bool,
    ready: bool,
    banner: Option<String>,
    validity: ValidityIndicator,
    upload: UploadIndicator,
    copy_confirmed_at: Option<Instant>,
    epoch: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Queries --

    /// The phase shown to the user. Loading wins over a pending error.
    pub fn phase(&self) -> UiState {
        if self.loading {
            UiState::Loading
        } else if let Some(message) = &self.banner {
            UiState::Error(message.clone())
        } else if self.ready {
            UiState::Ready {
                has_configuration: self.configuration().is_some(),
            }
        } else {
            UiState::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The generated configuration. Empty text counts as none.
    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref().filter(|c| !c.is_empty())
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Current error banner text, if any.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn validity(&self) -> &ValidityIndicator {
        &self.validity
    }

    pub fn upload(&self) -> &UploadIndicator {
        &self.upload
    }

    pub fn actions(&self) -> Actions {
        let loading = self.is_loading();
        let has_configuration = self.configuration().is_some();
        Actions {
            generate: !loading,
            explain: has_configuration && !loading,
            copy: has_configuration,
        }
    }

    /// What the output panel shows.
    pub fn output(&self) -> Option<DisplayJson> {
        self.configuration().map(validator::display)
    }

    /// Copy control label at time `now`.
    pub fn copy_label(&self, now: Instant) -> &'static str {
        match self.copy_confirmed_at {
            Some(at) if now.saturating_duration_since(at) < COPY_FEEDBACK => COPY_CONFIRMED_LABEL,
            _ => COPY_LABEL,
        }
    }

    /// When the copy confirmation expires, if one is showing.
    pub fn copy_feedback_deadline(&self) -> Option<Instant> {
        self.copy_confirmed_at.map(|at| at + COPY_FEEDBACK)
    }

    // -- Form edits --

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Replace the seed text and re-run live validation.
    pub fn set_seed(&mut self, seed: impl Into<String>) {
        self.seed = seed.into();
        self.validity = ValidityIndicator::for_seed(&self.seed);
    }

    // -- Generate --

    /// Validate locally and enter loading.
    ///
    /// Hides any error and any explanation. No state changes on failure
    /// other than the error banner.
    pub fn start_generate(
        &mut self,
        description: &str,
        seed: Option<&str>,
    ) -> Result<(RequestTicket, GenerateRequest), WorkflowError> {
        if self.is_loading() {
            return Err(WorkflowError::RequestInFlight);
        }
        if description.trim().is_empty() {
            return Err(self.fail(WorkflowError::EmptyDescription));
        }

        let request = GenerateRequest::new(description, seed);
        self.explanation = None;
        Ok((self.enter_loading(RequestKind::Generate), request))
    }

    /// Apply a generate outcome.
    ///
    /// On success the configuration is replaced wholesale. On failure it is
    /// left unchanged.
    pub fn finish_generate(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<String, RemoteError>,
    ) -> Result<Completion, WorkflowError> {
        if !self.is_current(ticket, RequestKind::Generate) {
            return Ok(Completion::Stale);
        }

        match outcome {
            Ok(json) => {
                self.configuration = Some(json);
                self.validity = ValidityIndicator::ConfigurationGenerated;
                self.settle();
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.loading = false;
                Err(self.fail(e.into()))
            }
        }
    }

    // -- Explain --

    pub fn start_explain(&mut self) -> Result<(RequestTicket, ExplainRequest), WorkflowError> {
        if self.is_loading() {
            return Err(WorkflowError::RequestInFlight);
        }
        let Some(json) = self.configuration().map(str::to_string) else {
            return Err(self.fail(WorkflowError::NoConfiguration));
        };
        Ok((
            self.enter_loading(RequestKind::Explain),
            ExplainRequest { json },
        ))
    }

    /// Apply an explain outcome. The explanation is replaced, never appended;
    /// on failure the previous explanation stays as it was.
    pub fn finish_explain(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<String, RemoteError>,
    ) -> Result<Completion, WorkflowError> {
        if !self.is_current(ticket, RequestKind::Explain) {
            return Ok(Completion::Stale);
        }

        match outcome {
            Ok(explanation) => {
                self.explanation = Some(explanation);
                self.settle();
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.loading = false;
                Err(self.fail(e.into()))
            }
        }
    }

    // -- File ingestion --

    /// Accept an uploaded file's text as the seed.
    ///
    /// Invalid JSON leaves the seed untouched and marks the upload rejected.
    pub fn accept_seed_file(&mut self, name: &str, content: String) -> Result<(), WorkflowError> {
        if let Err(detail) = validator::parse(&content) {
            self.upload = UploadIndicator::Rejected(name.to_string());
            return Err(self.fail(WorkflowError::InvalidJsonFile {
                name: name.to_string(),
                detail,
            }));
        }

        self.upload = UploadIndicator::Loaded(name.to_string());
        self.set_seed(content);
        Ok(())
    }

    // -- Copy --

    pub fn mark_copied(&mut self, now: Instant) {
        self.copy_confirmed_at = Some(now);
    }

    // -- Clear --

    /// Reset every field to empty/neutral and invalidate in-flight requests.
    pub fn clear(&mut self) {
        *self = Self {
            epoch: self.epoch + 1,
            ..Self::default()
        };
    }

    // -- Internal --

    /// Record an error in the banner and hand it back to the caller.
    pub(crate) fn fail(&mut self, error: WorkflowError) -> WorkflowError {
        self.banner = Some(error.to_string());
        error
    }

    fn enter_loading(&mut self, kind: RequestKind) -> RequestTicket {
        self.epoch += 1;
        self.loading = true;
        self.banner = None;
        RequestTicket {
            epoch: self.epoch,
            kind,
            issued_at: Instant::now(),
        }
    }

    fn is_current(&self, ticket: RequestTicket, kind: RequestKind) -> bool {
        ticket.kind == kind && ticket.epoch == self.epoch && self.is_loading()
    }

    fn settle(&mut self) {
        self.loading = false;
        self.ready = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
