/// Workflow controller: the operations a user can trigger.
///
/// [`Workflow`] owns the [`AppState`] and wires each operation to its
/// collaborators:
///
/// | Operation      | Collaborator        | Enters loading |
/// |----------------|---------------------|----------------|
/// | `generate`     | [`ConfigService`]   | yes            |
/// | `explain`      | [`ConfigService`]   | yes            |
/// | `ingest_file`  | [`SeedFile`]        | no             |
/// | `copy`         | [`Clipboard`]       | no             |
/// | `clear`        | —                   | no             |
///
/// Every transition is followed by a [`Renderer::render`] call and an
/// activity log entry. Remote operations come in two forms: the blocking
/// `generate`/`explain`, and `start_*`/`finish_*` pairs for callers that run
/// the service call elsewhere (the interactive shell runs it on a worker
/// thread and finishes when the result arrives).
pub mod state;

use std::sync::Arc;
use std::time::Instant;

use crate::activity::{ActivityEntry, ActivityLog, Operation};
use crate::clipboard::Clipboard;
use crate::error::{RemoteError, WorkflowError};
use crate::ingest::{self, SeedFile};
use crate::render::Renderer;
use crate::service::{ConfigService, ExplainRequest, GenerateRequest};

pub use state::{AppState, Completion, RequestKind, RequestTicket, UiState};

pub struct Workflow<C: Clipboard, R: Renderer> {
    state: AppState,
    service: Arc<dyn ConfigService>,
    clipboard: C,
    renderer: R,
    activity: ActivityLog,
}

impl<C: Clipboard, R: Renderer> Workflow<C, R> {
    /// Create a workflow in the `Idle` state and draw it once.
    pub fn new(service: Arc<dyn ConfigService>, clipboard: C, renderer: R) -> Self {
        let mut workflow = Self {
            state: AppState::new(),
            service,
            clipboard,
            renderer,
            activity: ActivityLog::disabled(),
        };
        workflow.render();
        workflow
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Shared handle to the service, for running requests off-thread.
    pub fn service(&self) -> Arc<dyn ConfigService> {
        Arc::clone(&self.service)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Redraw the current state (e.g. when the copy confirmation expires).
    pub fn render(&mut self) {
        self.renderer.render(&self.state);
    }

    // -- Form fields --

    pub fn set_description(&mut self, description: &str) {
        self.state.set_description(description);
        self.render();
    }

    /// Replace the seed text; the validity indicator is refreshed.
    pub fn set_seed(&mut self, seed: &str) {
        self.state.set_seed(seed);
        self.render();
    }

    // -- Generate --

    /// Generate a configuration, blocking on the service.
    pub fn generate(
        &mut self,
        description: &str,
        seed: Option<&str>,
    ) -> Result<Completion, WorkflowError> {
        let (ticket, request) = self.start_generate(description, seed)?;
        let outcome = self.service.generate(&request);
        self.finish_generate(ticket, outcome)
    }

    /// Generate using the description and seed currently in the form.
    pub fn generate_from_form(&mut self) -> Result<Completion, WorkflowError> {
        let description = self.state.description.clone();
        let seed = self.state.seed.clone();
        self.generate(&description, Some(&seed))
    }

    pub fn start_generate(
        &mut self,
        description: &str,
        seed: Option<&str>,
    ) -> Result<(RequestTicket, GenerateRequest), WorkflowError> {
        let started = self.state.start_generate(description, seed);
        self.render();
        if let Err(e) = &started {
            self.log_failure(Operation::Generate, e, None);
        }
        started
    }

    pub fn finish_generate(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<String, RemoteError>,
    ) -> Result<Completion, WorkflowError> {
        let result = self.state.finish_generate(ticket, outcome);
        self.render();
        self.log_finish(Operation::Generate, ticket, &result);
        result
    }

    // -- Explain --

    /// Explain the current configuration, blocking on the service.
    pub fn explain(&mut self) -> Result<Completion, WorkflowError> {
        let (ticket, request) = self.start_explain()?;
        let outcome = self.service.explain(&request);
        self.finish_explain(ticket, outcome)
    }

    pub fn start_explain(&mut self) -> Result<(RequestTicket, ExplainRequest), WorkflowError> {
        let started = self.state.start_explain();
        self.render();
        if let Err(e) = &started {
            self.log_failure(Operation::Explain, e, None);
        }
        started
    }

    pub fn finish_explain(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<String, RemoteError>,
    ) -> Result<Completion, WorkflowError> {
        let result = self.state.finish_explain(ticket, outcome);
        self.render();
        self.log_finish(Operation::Explain, ticket, &result);
        result
    }

    // -- File ingestion --

    /// Load a seed configuration from a file.
    ///
    /// The name is checked before anything is read. Only parseable JSON
    /// replaces the seed.
    pub fn ingest_file(&mut self, file: &dyn SeedFile) -> Result<(), WorkflowError> {
        let result = self.ingest(file);
        self.render();
        match &result {
            Ok(()) => self.activity.record(
                &ActivityEntry::new(Operation::Ingest, true).with_detail(file.name()),
            ),
            Err(e) => self.log_failure(Operation::Ingest, e, None),
        }
        result
    }

    fn ingest(&mut self, file: &dyn SeedFile) -> Result<(), WorkflowError> {
        let name = file.name().to_string();
        if !ingest::is_json_file_name(&name) {
            return Err(self.state.fail(WorkflowError::UnsupportedFileType { name }));
        }

        let content = match file.read_text() {
            Ok(content) => content,
            Err(source) => {
                return Err(self.state.fail(WorkflowError::FileRead { name, source }));
            }
        };

        self.state.accept_seed_file(&name, content)
    }

    // -- Copy --

    /// Copy the current configuration to the clipboard.
    pub fn copy(&mut self) -> Result<(), WorkflowError> {
        let result = self.copy_to_clipboard();
        self.render();
        match &result {
            Ok(()) => self
                .activity
                .record(&ActivityEntry::new(Operation::Copy, true)),
            Err(e) => self.log_failure(Operation::Copy, e, None),
        }
        result
    }

    fn copy_to_clipboard(&mut self) -> Result<(), WorkflowError> {
        let Some(json) = self.state.configuration().map(str::to_string) else {
            return Err(self.state.fail(WorkflowError::NothingToCopy));
        };

        match self.clipboard.write_text(&json) {
            Ok(()) => {
                self.state.mark_copied(Instant::now());
                Ok(())
            }
            Err(e) => Err(self.state.fail(WorkflowError::Clipboard(e.to_string()))),
        }
    }

    // -- Clear --

    /// Reset everything to empty. In-flight requests become stale.
    pub fn clear(&mut self) {
        self.state.clear();
        self.render();
        self.activity
            .record(&ActivityEntry::new(Operation::Clear, true));
    }

    // -- Activity --

    fn log_finish(
        &self,
        operation: Operation,
        ticket: RequestTicket,
        result: &Result<Completion, WorkflowError>,
    ) {
        let latency = ticket.elapsed_ms();
        match result {
            Ok(Completion::Applied) => self
                .activity
                .record(&ActivityEntry::new(operation, true).with_latency(latency)),
            Ok(Completion::Stale) => self.activity.record(
                &ActivityEntry::new(operation, true)
                    .with_latency(latency)
                    .with_detail("discarded stale response"),
            ),
            Err(e) => self.log_failure(operation, e, Some(latency)),
        }
    }

    fn log_failure(&self, operation: Operation, error: &WorkflowError, latency: Option<u64>) {
        let mut entry = ActivityEntry::new(operation, false).with_detail(error.to_string());
        entry.latency_ms = latency;
        self.activity.record(&entry);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::render::NullRenderer;

    /// Service that answers every call with the same canned outcome.
    struct Canned {
        outcome: Result<String, RemoteError>,
        calls: Mutex<usize>,
    }

    impl ConfigService for Canned {
        fn generate(&self, _request: &GenerateRequest) -> Result<String, RemoteError> {
            *self.calls.lock().unwrap() += 1;
            self.outcome.clone()
        }

        fn explain(&self, _request: &ExplainRequest) -> Result<String, RemoteError> {
            *self.calls.lock().unwrap() += 1;
            self.outcome.clone()
        }
    }

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn write_text(&mut self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("no clipboard in tests")
        }
    }

    fn workflow(
        outcome: Result<String, RemoteError>,
    ) -> (Workflow<NoClipboard, NullRenderer>, Arc<Canned>) {
        let service = Arc::new(Canned {
            outcome,
            calls: Mutex::new(0),
        });
        let wf = Workflow::new(service.clone(), NoClipboard, NullRenderer);
        (wf, service)
    }

    #[test]
    fn generate_from_form_uses_form_fields() {
        let (mut wf, service) = workflow(Ok("{\"v\":1}".into()));
        wf.set_description("checkout flow test");
        wf.set_seed("");
        assert_eq!(wf.generate_from_form().unwrap(), Completion::Applied);
        assert_eq!(*service.calls.lock().unwrap(), 1);
        assert_eq!(wf.state().configuration(), Some("{\"v\":1}"));
    }

    #[test]
    fn copy_without_configuration_is_refused() {
        let (mut wf, _) = workflow(Ok("{}".into()));
        let err = wf.copy().unwrap_err();
        assert!(matches!(err, WorkflowError::NothingToCopy));
    }

    #[test]
    fn clipboard_failure_surfaces_generic_message() {
        let (mut wf, _) = workflow(Ok("{}".into()));
        wf.generate("test", None).unwrap();
        let err = wf.copy().unwrap_err();
        assert!(matches!(err, WorkflowError::Clipboard(_)));
        assert_eq!(wf.state().banner(), Some("Failed to copy to clipboard"));
        assert_eq!(wf.state().configuration(), Some("{}"));
    }

    #[test]
    fn finish_after_clear_is_stale() {
        let (mut wf, service) = workflow(Ok("{}".into()));
        let (ticket, request) = wf.start_generate("test", None).unwrap();
        wf.clear();
        let outcome = service.generate(&request);
        assert_eq!(wf.finish_generate(ticket, outcome).unwrap(), Completion::Stale);
        assert!(wf.state().configuration().is_none());
        assert!(!wf.state().is_loading());
    }
}
