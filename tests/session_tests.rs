/// Session tests against a scripted analysis API.
///
/// Covers input validation before any request, the success/failure/cancel
/// outcomes, and the delayed cancel option.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use docinsight::ClientError;
use docinsight::api::{AnalysisApi, DocumentUpload, ModelCatalog};
use docinsight::cancel::CancellationToken;
use docinsight::report::{Report, parse_report};
use docinsight::session::{
    AnalysisOutcome, MISSING_INPUT_MESSAGE, MISSING_MODEL_MESSAGE, RESULTS_SHOWN_MESSAGE, Session,
    UiState,
};
use docinsight::theme::{MemoryThemeStore, ThemeManager};
use docinsight::view::{SortKey, ViewParams};

const SAMPLE: &str = include_str!("fixtures/sample_report.json");

// ---------------------------------------------------------------------------
// Scripted API
// ---------------------------------------------------------------------------

enum Script {
    Succeed(Report),
    Fail(ClientError),
    /// Cancel the token after a short delay, as a reset would.
    CancelSoon,
    /// Block until someone else cancels the token.
    WaitForCancel,
}

struct FakeApi {
    script: Script,
    calls: AtomicUsize,
    seen: Mutex<Option<(String, String, String)>>,
}

impl FakeApi {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisApi for FakeApi {
    fn fetch_models(&self) -> Result<ModelCatalog, ClientError> {
        Ok(ModelCatalog::new())
    }

    fn perform_analysis(
        &self,
        api_key: &str,
        file: &DocumentUpload,
        model_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock().unwrap() = Some((
            api_key.to_string(),
            file.file_name.clone(),
            model_name.to_string(),
        ));

        match &self.script {
            Script::Succeed(report) => Ok(report.clone()),
            Script::Fail(err) => Err(err.clone()),
            Script::CancelSoon => {
                thread::sleep(Duration::from_millis(30));
                cancel.cancel();
                Err(ClientError::Cancelled)
            }
            Script::WaitForCancel => {
                while !cancel.is_cancelled() {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(ClientError::Cancelled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn session_with_delay(delay: Duration) -> Session {
    Session::new(
        ThemeManager::initialize(Box::new(MemoryThemeStore::default())),
        delay,
    )
}

fn ready_session() -> Session {
    let mut session = session_with_delay(Duration::from_secs(8));
    session.set_api_key("  sk-test  ");
    session.select_file(DocumentUpload::new("q3.pdf", b"%PDF-1.7".to_vec()));
    session.set_model(Some("openai:gpt-4o".to_string()));
    session
}

fn never_offered() -> (Arc<AtomicBool>, impl FnOnce(CancellationToken) + Send + 'static) {
    let shown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shown);
    (shown, move |_token| flag.store(true, Ordering::SeqCst))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn empty_api_key_sends_nothing() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.set_api_key("   ");

    let outcome = session.start_analysis(&api, |_| {});
    assert_eq!(
        outcome,
        AnalysisOutcome::Rejected(MISSING_INPUT_MESSAGE.to_string())
    );
    assert_eq!(api.calls(), 0);
    assert_eq!(session.error(), Some(MISSING_INPUT_MESSAGE));
    assert_eq!(session.state(), UiState::Setup);
}

#[test]
fn missing_file_sends_nothing() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.clear_file();

    session.start_analysis(&api, |_| {});
    assert_eq!(api.calls(), 0);
    assert_eq!(session.error(), Some(MISSING_INPUT_MESSAGE));
}

#[test]
fn missing_model_sends_nothing() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.set_model(Some(String::new()));

    let outcome = session.start_analysis(&api, |_| {});
    assert_eq!(
        outcome,
        AnalysisOutcome::Rejected(MISSING_MODEL_MESSAGE.to_string())
    );
    assert_eq!(api.calls(), 0);
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[test]
fn successful_analysis_shows_results() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.set_sort(SortKey::Severity);

    let outcome = session.start_analysis(&api, |_| {});
    assert_eq!(outcome, AnalysisOutcome::Completed { insights: 6 });
    assert_eq!(session.state(), UiState::Results);
    assert_eq!(session.params(), ViewParams::default());
    assert!(session.error().is_none());
    assert!(!session.is_busy());

    let seen = api.seen.lock().unwrap().clone().unwrap();
    assert_eq!(
        seen,
        (
            "sk-test".to_string(),
            "q3.pdf".to_string(),
            "openai:gpt-4o".to_string()
        )
    );

    let view = session.results_view().unwrap();
    assert_eq!(view.cards.len(), 6);
    assert_eq!(session.charts().len(), 1);
}

#[test]
fn failed_analysis_sets_banner_and_returns_to_setup() {
    let api = FakeApi::new(Script::Fail(ClientError::Server {
        status: 401,
        detail: Some("Invalid API key.".to_string()),
    }));
    let mut session = ready_session();

    let outcome = session.start_analysis(&api, |_| {});
    assert_eq!(
        outcome,
        AnalysisOutcome::Failed("Analysis failed: Invalid API key.".to_string())
    );
    assert_eq!(session.state(), UiState::Setup);
    assert_eq!(session.error(), Some("Analysis failed: Invalid API key."));
    // Inputs survive a failure so the user can retry.
    assert!(session.can_analyze());
}

#[test]
fn network_failure_is_reported() {
    let api = FakeApi::new(Script::Fail(ClientError::Network(
        "connection refused".to_string(),
    )));
    let mut session = ready_session();

    session.start_analysis(&api, |_| {});
    assert_eq!(
        session.error(),
        Some("Analysis failed: network error: connection refused")
    );
}

#[test]
fn early_cancel_resets_silently_without_offering_cancel() {
    let api = FakeApi::new(Script::CancelSoon);
    let mut session = ready_session();
    let (shown, on_cancel_available) = never_offered();

    let outcome = session.start_analysis(&api, on_cancel_available);
    assert_eq!(outcome, AnalysisOutcome::Cancelled);
    assert_eq!(session.state(), UiState::Setup);
    assert!(session.error().is_none());
    assert!(session.file().is_none());
    assert!(!shown.load(Ordering::SeqCst));
}

#[test]
fn cancel_option_appears_after_delay_and_cancels() {
    let api = FakeApi::new(Script::WaitForCancel);
    let mut session = session_with_delay(Duration::from_millis(20));
    session.set_api_key("sk-test");
    session.select_file(DocumentUpload::new("notes.txt", b"hello".to_vec()));
    session.set_model(Some("openai:gpt-4o".to_string()));

    let offered = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&offered);
    let outcome = session.start_analysis(&api, move |token| {
        flag.store(true, Ordering::SeqCst);
        token.cancel();
    });

    assert_eq!(outcome, AnalysisOutcome::Cancelled);
    assert!(offered.load(Ordering::SeqCst));
    assert_eq!(session.state(), UiState::Setup);
    assert!(session.error().is_none());
}

// ---------------------------------------------------------------------------
// State rules
// ---------------------------------------------------------------------------

#[test]
fn new_analysis_requires_reset_from_results() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.start_analysis(&api, |_| {});
    assert_eq!(session.state(), UiState::Results);

    let outcome = session.start_analysis(&api, |_| {});
    assert_eq!(
        outcome,
        AnalysisOutcome::Rejected(RESULTS_SHOWN_MESSAGE.to_string())
    );
    assert_eq!(api.calls(), 1);
    assert_eq!(session.state(), UiState::Results);
}

#[test]
fn reset_returns_to_setup_and_keeps_model() {
    let api = FakeApi::new(Script::Succeed(parse_report(SAMPLE).unwrap()));
    let mut session = ready_session();
    session.start_analysis(&api, |_| {});

    session.reset();
    assert_eq!(session.state(), UiState::Setup);
    assert!(session.report().is_none());
    assert!(!session.has_api_key());
    assert!(session.file().is_none());
    assert_eq!(session.model(), Some("openai:gpt-4o"));
    assert!(session.charts().is_empty());
}

#[test]
fn uploaded_report_replaces_results_from_any_state() {
    let mut session = ready_session();
    session.load_report_json(SAMPLE).unwrap();
    assert_eq!(session.state(), UiState::Results);

    let err = session.load_report_json("not json").unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(session.state(), UiState::Results);
    assert!(session.error().unwrap().starts_with("Failed to load report:"));
    assert_eq!(session.report().unwrap().insights.len(), 6);
}

#[test]
fn missing_report_file_is_a_read_error_with_banner() {
    let mut session = ready_session();
    let err = session
        .load_report_file(std::path::Path::new("/definitely/not/here.json"))
        .unwrap_err();
    assert!(matches!(err, ClientError::Read(_)));
    assert_eq!(session.error(), Some("Failed to read the report file."));
    assert_eq!(session.state(), UiState::Setup);
}
