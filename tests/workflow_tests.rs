/// Workflow integration tests.
///
/// Drives the public `Workflow` API with in-memory collaborators: a scripted
/// service that records every call, a clipboard that records what it was
/// given, in-memory seed files that count reads, and a renderer that keeps a
/// copy of every state it was asked to draw.
use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use mvtgen::clipboard::Clipboard;
use mvtgen::error::{EXPLAIN_FAILED, ErrorKind, GENERATE_FAILED, RemoteError, WorkflowError};
use mvtgen::ingest::{PathSeedFile, SeedFile};
use mvtgen::render::Renderer;
use mvtgen::service::{ConfigService, ExplainRequest, GenerateRequest};
use mvtgen::validator::{self, DisplayJson, JsonValidation};
use mvtgen::workflow::state::{
    COPY_CONFIRMED_LABEL, COPY_FEEDBACK, COPY_LABEL, UploadIndicator, ValidityIndicator,
};
use mvtgen::workflow::{AppState, Completion, UiState, Workflow};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Generate(GenerateRequest),
    Explain(ExplainRequest),
}

/// Service that answers from a script and records every request.
#[derive(Default)]
struct ScriptedService {
    replies: Mutex<VecDeque<Result<String, RemoteError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    fn replying(replies: Vec<Result<String, RemoteError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<String, RemoteError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::transport("no scripted reply")))
    }
}

impl ConfigService for ScriptedService {
    fn generate(&self, request: &GenerateRequest) -> Result<String, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Generate(request.clone()));
        self.next_reply()
    }

    fn explain(&self, request: &ExplainRequest) -> Result<String, RemoteError> {
        self.calls.lock().unwrap().push(Call::Explain(request.clone()));
        self.next_reply()
    }
}

/// Clipboard that records writes, or refuses them.
#[derive(Clone, Default)]
struct MockClipboard {
    written: Arc<Mutex<Vec<String>>>,
    broken: bool,
}

impl Clipboard for MockClipboard {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        if self.broken {
            anyhow::bail!("clipboard unavailable");
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Renderer that keeps every frame.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<AppState>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, state: &AppState) {
        self.frames.push(state.clone());
    }
}

/// In-memory seed file that counts reads.
struct MemFile {
    name: String,
    contents: Result<String, io::ErrorKind>,
    reads: Cell<usize>,
}

impl MemFile {
    fn new(name: &str, contents: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: Ok(contents.to_string()),
            reads: Cell::new(0),
        }
    }

    fn unreadable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: Err(io::ErrorKind::PermissionDenied),
            reads: Cell::new(0),
        }
    }
}

impl SeedFile for MemFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_text(&self) -> io::Result<String> {
        self.reads.set(self.reads.get() + 1);
        self.contents.clone().map_err(io::Error::from)
    }
}

type TestWorkflow = Workflow<MockClipboard, RecordingRenderer>;

fn setup(replies: Vec<Result<String, RemoteError>>) -> (TestWorkflow, Arc<ScriptedService>) {
    setup_with_clipboard(replies, MockClipboard::default())
}

fn setup_with_clipboard(
    replies: Vec<Result<String, RemoteError>>,
    clipboard: MockClipboard,
) -> (TestWorkflow, Arc<ScriptedService>) {
    let service = ScriptedService::replying(replies);
    let workflow = Workflow::new(service.clone(), clipboard, RecordingRenderer::default());
    (workflow, service)
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[test]
fn valid_json_pretty_prints_to_an_equal_value() {
    let inputs = [
        "{}",
        "[]",
        "42",
        "\"text\"",
        "null",
        r#"{"variants":[{"name":"control","weight":50},{"name":"blue","weight":50}]}"#,
        r#"  {"nested": {"deep": [1, 2.5, -3e2, true, false, null]}}  "#,
        r#"{"unicode":"✓ ünïcødé","escaped":"line\nbreak"}"#,
    ];

    for input in inputs {
        let JsonValidation::Valid { pretty } = validator::validate(input) else {
            panic!("expected valid: {input}");
        };
        let original: serde_json::Value = serde_json::from_str(input).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(original, reparsed, "round trip changed {input}");
    }
}

#[test]
fn malformed_json_is_invalid_with_detail() {
    let inputs = [
        "{not json",
        "{\"a\":}",
        "[1, 2,",
        "{'single': 'quotes'}",
        "}",
        "{\"a\":1}}",
        "\u{0}",
    ];

    for input in inputs {
        match validator::validate(input) {
            JsonValidation::Invalid { detail } => assert!(!detail.is_empty()),
            other => panic!("expected invalid for {input:?}, got {other:?}"),
        }
    }
}

#[test]
fn whitespace_only_input_is_neutral() {
    assert_eq!(validator::validate(""), JsonValidation::Empty);
    assert_eq!(validator::validate(" \n\t "), JsonValidation::Empty);
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

#[test]
fn empty_description_fails_locally_without_a_request() {
    let (mut wf, service) = setup(vec![Ok("{}".into())]);

    for description in ["", "   ", "\n\t"] {
        let err = wf.generate(description, None).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyDescription));
        assert_eq!(err.kind(), ErrorKind::LocalValidation);
    }

    assert!(service.calls().is_empty());
    assert_eq!(wf.state().banner(), Some("Please describe your A/B test"));
    assert!(wf.renderer().frames.iter().all(|s| !s.is_loading()));
}

#[test]
fn successful_generate_stores_exact_text_and_enables_actions() {
    let returned = "{\"variants\":2,  \"split\":[50,50]}";
    let (mut wf, service) = setup(vec![Ok(returned.into())]);

    assert!(!wf.state().actions().explain);
    assert!(!wf.state().actions().copy);

    let completion = wf.generate("  checkout test  ", None).unwrap();
    assert_eq!(completion, Completion::Applied);
    assert_eq!(wf.state().configuration(), Some(returned));

    let actions = wf.state().actions();
    assert!(actions.generate && actions.explain && actions.copy);
    assert_eq!(
        wf.state().phase(),
        UiState::Ready {
            has_configuration: true
        }
    );
    assert_eq!(
        wf.state().validity(),
        &ValidityIndicator::ConfigurationGenerated
    );

    assert_eq!(
        service.calls(),
        vec![Call::Generate(GenerateRequest {
            description: "checkout test".into(),
            existing_json: None,
        })]
    );
}

#[test]
fn button_color_scenario_renders_pretty_output() {
    let (mut wf, _) = setup(vec![Ok("{\"variants\":2}".into())]);

    wf.generate("button color test, 50/50 split", None).unwrap();

    assert_eq!(
        wf.state().output(),
        Some(DisplayJson::Formatted("{\n  \"variants\": 2\n}".into()))
    );
    let actions = wf.state().actions();
    assert!(actions.explain);
    assert!(actions.copy);
}

#[test]
fn seed_is_trimmed_and_blank_seed_is_sent_as_null() {
    let (mut wf, service) = setup(vec![Ok("{}".into()), Ok("{}".into())]);

    wf.generate("test", Some("   ")).unwrap();
    wf.generate("test", Some("  {\"a\":1}  ")).unwrap();

    let calls = service.calls();
    let Call::Generate(first) = &calls[0] else {
        panic!("expected generate");
    };
    let Call::Generate(second) = &calls[1] else {
        panic!("expected generate");
    };
    assert_eq!(first.existing_json, None);
    assert_eq!(second.existing_json.as_deref(), Some("{\"a\":1}"));
}

#[test]
fn generate_enters_and_always_leaves_loading() {
    let (mut wf, _) = setup(vec![
        Ok("{}".into()),
        Err(RemoteError::status(500, None, GENERATE_FAILED)),
    ]);

    wf.generate("first", None).unwrap();
    let _ = wf.generate("second", None);

    let loading_frames = wf
        .renderer()
        .frames
        .iter()
        .filter(|s| s.phase() == UiState::Loading)
        .count();
    assert_eq!(loading_frames, 2);
    assert!(!wf.state().is_loading());

    // While loading, generate and explain were both disabled.
    for frame in wf.renderer().frames.iter().filter(|s| s.is_loading()) {
        assert!(!frame.actions().generate);
        assert!(!frame.actions().explain);
    }
}

#[test]
fn failed_generate_keeps_previous_configuration_and_actions() {
    let (mut wf, _) = setup(vec![
        Ok("{\"v\":1}".into()),
        Err(RemoteError::status(
            400,
            Some("Description is required".into()),
            GENERATE_FAILED,
        )),
    ]);

    wf.generate("first", None).unwrap();
    let before = wf.state().actions();

    let err = wf.generate("second", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(wf.state().banner(), Some("Description is required"));
    assert_eq!(wf.state().configuration(), Some("{\"v\":1}"));
    assert_eq!(wf.state().actions(), before);
}

#[test]
fn failed_first_generate_leaves_explain_and_copy_disabled() {
    let (mut wf, service) = setup(vec![Err(RemoteError::status(500, None, GENERATE_FAILED))]);

    let err = wf.generate("test", None).unwrap_err();
    assert_eq!(err.to_string(), GENERATE_FAILED);
    assert_eq!(wf.state().phase(), UiState::Error(GENERATE_FAILED.into()));

    let actions = wf.state().actions();
    assert!(actions.generate);
    assert!(!actions.explain);
    assert!(!actions.copy);

    assert!(matches!(wf.explain(), Err(WorkflowError::NoConfiguration)));
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn empty_generated_text_counts_as_no_configuration() {
    let (mut wf, service) = setup(vec![Ok(String::new()), Ok("never".into())]);

    assert_eq!(wf.generate("test", None).unwrap(), Completion::Applied);
    assert!(!wf.state().is_loading());
    assert!(wf.state().configuration().is_none());
    assert!(wf.state().output().is_none());

    let actions = wf.state().actions();
    assert!(actions.generate);
    assert!(!actions.explain);
    assert!(!actions.copy);

    let err = wf.explain().unwrap_err();
    assert!(matches!(err, WorkflowError::NoConfiguration));
    assert!(matches!(wf.copy(), Err(WorkflowError::NothingToCopy)));
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn starting_a_request_hides_the_banner_and_explanation() {
    let (mut wf, _) = setup(vec![Ok("{}".into()), Ok("explained".into())]);

    wf.generate("test", None).unwrap();
    wf.explain().unwrap();
    let _ = wf.generate("", None);
    assert!(wf.state().banner().is_some());
    assert_eq!(wf.state().explanation(), Some("explained"));

    let (ticket, _) = wf.start_generate("again", None).unwrap();
    assert!(wf.state().banner().is_none());
    assert!(wf.state().explanation().is_none());
    wf.finish_generate(ticket, Ok("{}".into())).unwrap();
}

#[test]
fn second_start_while_loading_is_refused_without_a_request() {
    let (mut wf, service) = setup(vec![]);

    let (ticket, _) = wf.start_generate("first", None).unwrap();
    let err = wf.start_generate("second", None).unwrap_err();
    assert!(matches!(err, WorkflowError::RequestInFlight));
    assert!(wf.state().is_loading());
    assert!(service.calls().is_empty());

    wf.finish_generate(ticket, Ok("{}".into())).unwrap();
    assert!(!wf.state().is_loading());
}

// ---------------------------------------------------------------------------
// explain
// ---------------------------------------------------------------------------

#[test]
fn explain_before_generate_fails_locally() {
    let (mut wf, service) = setup(vec![Ok("never".into())]);

    let err = wf.explain().unwrap_err();
    assert!(matches!(err, WorkflowError::NoConfiguration));
    assert_eq!(err.kind(), ErrorKind::LocalValidation);
    assert_eq!(wf.state().banner(), Some("No configuration to explain"));
    assert!(service.calls().is_empty());
}

#[test]
fn explain_sends_configuration_and_replaces_explanation() {
    let (mut wf, service) = setup(vec![
        Ok("{\"variants\":2}".into()),
        Ok("Two variants.".into()),
        Ok("Still two variants.".into()),
    ]);

    wf.generate("test", None).unwrap();
    wf.explain().unwrap();
    assert_eq!(wf.state().explanation(), Some("Two variants."));
    wf.explain().unwrap();
    assert_eq!(wf.state().explanation(), Some("Still two variants."));

    assert_eq!(
        service.calls()[1],
        Call::Explain(ExplainRequest {
            json: "{\"variants\":2}".into()
        })
    );
}

#[test]
fn failed_explain_keeps_explanation_and_configuration() {
    let (mut wf, _) = setup(vec![
        Ok("{}".into()),
        Ok("first explanation".into()),
        Err(RemoteError::status(502, None, EXPLAIN_FAILED)),
    ]);

    wf.generate("test", None).unwrap();
    wf.explain().unwrap();
    let err = wf.explain().unwrap_err();

    assert_eq!(err.to_string(), EXPLAIN_FAILED);
    assert_eq!(wf.state().explanation(), Some("first explanation"));
    assert_eq!(wf.state().configuration(), Some("{}"));
    assert!(!wf.state().is_loading());
    assert!(wf.state().actions().explain);
}

// ---------------------------------------------------------------------------
// ingest_file
// ---------------------------------------------------------------------------

#[test]
fn non_json_file_name_is_rejected_without_reading() {
    let (mut wf, _) = setup(vec![]);
    let file = MemFile::new("x.txt", "{\"a\":1}");

    let err = wf.ingest_file(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileType);
    assert_eq!(file.reads.get(), 0);
    assert_eq!(wf.state().banner(), Some("Please upload a JSON file"));
    assert_eq!(wf.state().seed, "");
}

#[test]
fn suffix_check_is_case_sensitive() {
    let (mut wf, _) = setup(vec![]);
    let file = MemFile::new("CONFIG.JSON", "{}");

    let err = wf.ingest_file(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileType);
    assert_eq!(file.reads.get(), 0);
}

#[test]
fn unparseable_file_leaves_seed_and_marks_upload_rejected() {
    let (mut wf, _) = setup(vec![]);
    wf.set_seed("{\"keep\":true}");
    let file = MemFile::new("broken.json", "{not json");

    let err = wf.ingest_file(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::JsonParse);
    assert!(
        wf.state()
            .banner()
            .is_some_and(|b| b.starts_with("Invalid JSON file: "))
    );
    assert_eq!(wf.state().seed, "{\"keep\":true}");
    assert_eq!(
        wf.state().upload(),
        &UploadIndicator::Rejected("broken.json".into())
    );
    assert_eq!(wf.state().upload().message(), "✗ broken.json (invalid)");
}

#[test]
fn file_with_byte_order_mark_loads_as_seed() {
    let dir = std::env::temp_dir().join(format!("mvtgen-wf-bom-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bom_seed.json");
    std::fs::write(&path, "\u{feff}{\"variants\":2}").unwrap();

    let (mut wf, _) = setup(vec![]);
    wf.ingest_file(&PathSeedFile::new(&path)).unwrap();

    assert_eq!(wf.state().seed, "{\"variants\":2}");
    assert_eq!(wf.state().upload().message(), "✓ bom_seed.json");
    assert_eq!(wf.state().validity(), &ValidityIndicator::ValidSeed);
    assert!(wf.state().banner().is_none());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn unreadable_file_reports_read_failure() {
    let (mut wf, _) = setup(vec![]);
    let file = MemFile::unreadable("locked.json");

    let err = wf.ingest_file(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileRead);
    assert_eq!(file.reads.get(), 1);
    assert_eq!(wf.state().banner(), Some("Failed to read file"));
}

#[test]
fn valid_file_becomes_seed_and_refreshes_validity() {
    let (mut wf, service) = setup(vec![Ok("{}".into())]);
    let contents = "{\n  \"variants\": [\"a\", \"b\"]\n}\n";
    let file = MemFile::new("base.json", contents);

    wf.ingest_file(&file).unwrap();
    assert_eq!(wf.state().seed, contents);
    assert_eq!(wf.state().upload().message(), "✓ base.json");
    assert_eq!(wf.state().validity(), &ValidityIndicator::ValidSeed);

    wf.generate_from_form().unwrap_err();
    wf.set_description("refine it");
    wf.generate_from_form().unwrap();
    let Call::Generate(request) = &service.calls()[0] else {
        panic!("expected generate");
    };
    assert_eq!(request.existing_json.as_deref(), Some(contents.trim()));
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

#[test]
fn clear_resets_everything_and_disables_explain() {
    let (mut wf, service) = setup(vec![Ok("{}".into()), Ok("text".into())]);

    wf.set_description("test");
    wf.set_seed("{bad");
    wf.ingest_file(&MemFile::new("seed.json", "{}")).unwrap();
    wf.generate_from_form().unwrap();
    wf.explain().unwrap();

    wf.clear();
    let state = wf.state();
    assert_eq!(state.description, "");
    assert_eq!(state.seed, "");
    assert!(state.configuration().is_none());
    assert!(state.explanation().is_none());
    assert!(state.banner().is_none());
    assert_eq!(state.upload(), &UploadIndicator::None);
    assert_eq!(state.validity(), &ValidityIndicator::Neutral);
    assert_eq!(state.phase(), UiState::Idle);
    assert!(!state.actions().explain);
    assert!(!state.actions().copy);

    let err = wf.explain().unwrap_err();
    assert!(matches!(err, WorkflowError::NoConfiguration));
    assert_eq!(service.calls().len(), 2);
}

#[test]
fn clear_is_idempotent() {
    let (mut wf, _) = setup(vec![Ok("{}".into())]);
    wf.generate("test", None).unwrap();

    wf.clear();
    let once = format!("{:?}", (wf.state().phase(), wf.state().actions()));
    wf.clear();
    let twice = format!("{:?}", (wf.state().phase(), wf.state().actions()));
    assert_eq!(once, twice);
    assert!(wf.state().configuration().is_none());
}

#[test]
fn response_after_clear_is_discarded() {
    let (mut wf, service) = setup(vec![Ok("{\"late\":true}".into())]);

    let (ticket, request) = wf.start_generate("test", None).unwrap();
    wf.clear();
    let outcome = service.generate(&request);

    assert_eq!(wf.finish_generate(ticket, outcome).unwrap(), Completion::Stale);
    assert!(wf.state().configuration().is_none());
    assert!(wf.state().banner().is_none());
    assert!(!wf.state().is_loading());
}

#[test]
fn superseded_request_cannot_overwrite_newer_result() {
    let (mut wf, _) = setup(vec![]);

    let (old, _) = wf.start_generate("old", None).unwrap();
    wf.clear();
    let (new, _) = wf.start_generate("new", None).unwrap();

    wf.finish_generate(new, Ok("{\"which\":\"new\"}".into())).unwrap();
    assert_eq!(
        wf.finish_generate(old, Ok("{\"which\":\"old\"}".into())).unwrap(),
        Completion::Stale
    );
    assert_eq!(wf.state().configuration(), Some("{\"which\":\"new\"}"));
}

// ---------------------------------------------------------------------------
// copy
// ---------------------------------------------------------------------------

#[test]
fn copy_confirmation_reverts_after_feedback_window() {
    let clipboard = MockClipboard::default();
    let written = Arc::clone(&clipboard.written);
    let (mut wf, _) = setup_with_clipboard(vec![Ok("{\"variants\":2}".into())], clipboard);

    wf.generate("test", None).unwrap();
    assert_eq!(wf.state().copy_label(Instant::now()), COPY_LABEL);

    wf.copy().unwrap();
    let now = Instant::now();
    assert_eq!(*written.lock().unwrap(), vec!["{\"variants\":2}".to_string()]);
    assert_eq!(wf.state().copy_label(now), COPY_CONFIRMED_LABEL);
    assert_eq!(wf.state().copy_label(now + COPY_FEEDBACK), COPY_LABEL);

    let deadline = wf.state().copy_feedback_deadline().unwrap();
    assert!(deadline <= now + COPY_FEEDBACK);
    assert!(deadline > now);
}

#[test]
fn copy_confirmation_expires_in_real_time() {
    let (mut wf, _) = setup(vec![Ok("{}".into())]);
    wf.generate("test", None).unwrap();
    wf.copy().unwrap();

    assert_eq!(wf.state().copy_label(Instant::now()), COPY_CONFIRMED_LABEL);
    std::thread::sleep(COPY_FEEDBACK + std::time::Duration::from_millis(50));
    assert_eq!(wf.state().copy_label(Instant::now()), COPY_LABEL);
}

#[test]
fn clipboard_failure_shows_generic_error_and_keeps_configuration() {
    let clipboard = MockClipboard {
        broken: true,
        ..MockClipboard::default()
    };
    let (mut wf, _) = setup_with_clipboard(vec![Ok("{}".into())], clipboard);

    wf.generate("test", None).unwrap();
    let err = wf.copy().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Clipboard);
    assert_eq!(wf.state().banner(), Some("Failed to copy to clipboard"));
    assert_eq!(wf.state().configuration(), Some("{}"));
    assert_eq!(wf.state().copy_label(Instant::now()), COPY_LABEL);
}

#[test]
fn copy_without_configuration_writes_nothing() {
    let clipboard = MockClipboard::default();
    let written = Arc::clone(&clipboard.written);
    let (mut wf, _) = setup_with_clipboard(vec![], clipboard);

    assert!(wf.copy().is_err());
    assert!(written.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Output panel
// ---------------------------------------------------------------------------

#[test]
fn non_json_configuration_is_displayed_raw() {
    let (mut wf, _) = setup(vec![Ok("Sorry, I could not do that".into())]);
    wf.generate("test", None).unwrap();

    assert_eq!(
        wf.state().output(),
        Some(DisplayJson::Raw("Sorry, I could not do that".into()))
    );
}
