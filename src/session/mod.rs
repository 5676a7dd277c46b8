//! Application state for one interactive session.
//!
//! [`Session`] is the single owner of everything the user has chosen or
//! received: API key, selected document, model, the current report, view
//! parameters, the error banner, the pending cancellation token, the theme
//! manager and the chart registry. Every mutation goes through a method that
//! also drives the [`UiState`] machine.

pub mod state;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::{AnalysisApi, DocumentUpload};
use crate::cancel::{CancelAffordance, CancellationToken};
use crate::chart::ChartRegistry;
use crate::error::ClientError;
use crate::export::{self, ExportArtifact, ExportAssets, ExportFormat};
use crate::report::{self, Report};
use crate::theme::{Theme, ThemeManager};
use crate::view::{ResultsView, SortDirection, SortKey, TypeFilter, ViewParams};

pub use state::{UiEvent, UiState};

pub const MISSING_INPUT_MESSAGE: &str = "Please provide an API key and select a file.";
pub const MISSING_MODEL_MESSAGE: &str = "Please wait for models to load or select a model.";
pub const BUSY_MESSAGE: &str = "An analysis is already in progress.";
pub const RESULTS_SHOWN_MESSAGE: &str = "Reset the session before starting a new analysis.";

/// How a call to [`Session::start_analysis`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed { insights: usize },
    /// Abandoned through the cancellation token; the session was reset.
    Cancelled,
    /// The request failed; the banner holds the message.
    Failed(String),
    /// Preconditions were not met and nothing was sent.
    Rejected(String),
}

pub struct Session {
    state: UiState,
    api_key: String,
    file: Option<DocumentUpload>,
    model: Option<String>,
    report: Option<Report>,
    params: ViewParams,
    error: Option<String>,
    pending: Option<CancellationToken>,
    cancel_delay: Duration,
    theme: ThemeManager,
    charts: ChartRegistry,
}

impl Session {
    pub fn new(mut theme: ThemeManager, cancel_delay: Duration) -> Self {
        let charts = ChartRegistry::subscribed(&mut theme);
        Self {
            state: UiState::Setup,
            api_key: String::new(),
            file: None,
            model: None,
            report: None,
            params: ViewParams::default(),
            error: None,
            pending: None,
            cancel_delay,
            theme,
            charts,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn params(&self) -> ViewParams {
        self.params
    }

    pub fn file(&self) -> Option<&DocumentUpload> {
        self.file.as_ref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    // -----------------------------------------------------------------------
    // Setup inputs
    // -----------------------------------------------------------------------

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    pub fn select_file(&mut self, file: DocumentUpload) {
        self.file = Some(file);
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model.filter(|m| !m.trim().is_empty());
    }

    /// Both an API key and a document are present.
    pub fn can_analyze(&self) -> bool {
        self.has_api_key() && self.file.is_some()
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Submit the selected document and wait for the result.
    ///
    /// `on_cancel_available` runs on a timer thread once the request has been
    /// pending for the cancel delay; it receives the request's token so the
    /// caller can wire up a cancel control. A request that finishes sooner
    /// never triggers it.
    pub fn start_analysis<F>(&mut self, api: &dyn AnalysisApi, on_cancel_available: F) -> AnalysisOutcome
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        if self.is_busy() {
            return AnalysisOutcome::Rejected(BUSY_MESSAGE.to_string());
        }
        if !self.can_analyze() {
            return self.reject(MISSING_INPUT_MESSAGE);
        }
        let Some(model) = self.model.clone() else {
            return self.reject(MISSING_MODEL_MESSAGE);
        };
        let Some(next) = self.state.transition(UiEvent::AnalysisStarted) else {
            return self.reject(RESULTS_SHOWN_MESSAGE);
        };
        let Some(file) = self.file.clone() else {
            return self.reject(MISSING_INPUT_MESSAGE);
        };

        self.error = None;
        self.state = next;
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let affordance = CancelAffordance::schedule(self.cancel_delay, token.clone(), on_cancel_available);

        let result = api.perform_analysis(self.api_key.trim(), &file, &model, &token);

        affordance.dismiss();
        self.pending = None;

        match result {
            _ if token.is_cancelled() => {
                self.reset();
                AnalysisOutcome::Cancelled
            }
            Err(ClientError::Cancelled) => {
                self.reset();
                AnalysisOutcome::Cancelled
            }
            Err(err) => {
                let message = format!("Analysis failed: {err}");
                self.error = Some(message.clone());
                self.apply(UiEvent::AnalysisFailed);
                AnalysisOutcome::Failed(message)
            }
            Ok(report) => {
                let insights = report.insights.len();
                self.show_report(report, UiEvent::AnalysisSucceeded);
                AnalysisOutcome::Completed { insights }
            }
        }
    }

    /// Signal the pending request, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match &self.pending {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Token of the in-flight request, for cancel controls on other threads.
    pub fn pending_token(&self) -> Option<CancellationToken> {
        self.pending.clone()
    }

    fn reject(&mut self, message: &str) -> AnalysisOutcome {
        self.error = Some(message.to_string());
        AnalysisOutcome::Rejected(message.to_string())
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Load a previously exported report. On failure the banner is set and
    /// the visible section stays as it was.
    pub fn load_report_json(&mut self, text: &str) -> Result<(), ClientError> {
        match report::parse_report(text) {
            Ok(report) => {
                self.error = None;
                self.show_report(report, UiEvent::ReportLoaded);
                Ok(())
            }
            Err(err) => {
                self.error = Some(format!("Failed to load report: {err}"));
                Err(err)
            }
        }
    }

    pub fn load_report_file(&mut self, path: &Path) -> Result<(), ClientError> {
        match std::fs::read_to_string(path) {
            Ok(text) => self.load_report_json(&text),
            Err(_) => {
                let err = ClientError::Read("Failed to read the report file.".to_string());
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Replace the current report and reset the view to its defaults.
    fn show_report(&mut self, report: Report, event: UiEvent) {
        self.report = Some(report);
        self.params = ViewParams::default();
        self.charts.destroy_all();
        self.apply(event);
    }

    /// Back to setup with the key, document, report, charts and banner cleared.
    pub fn reset(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.apply(UiEvent::Reset);
        self.api_key.clear();
        self.file = None;
        self.report = None;
        self.params = ViewParams::default();
        self.charts.destroy_all();
        self.error = None;
    }

    fn apply(&mut self, event: UiEvent) -> bool {
        match self.state.transition(event) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.params.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.params.sort = sort;
    }

    pub fn toggle_direction(&mut self) -> SortDirection {
        self.params.direction = self.params.direction.toggled();
        self.params.direction
    }

    pub fn set_view_params(&mut self, params: ViewParams) {
        self.params = params;
    }

    /// Rebuild the card list and the chart registry for the current report.
    pub fn results_view(&mut self) -> Option<ResultsView> {
        self.charts.refresh();
        let view = ResultsView::build(self.report.as_ref()?, self.params);
        self.charts.rebuild(view.chart_entries());
        Some(view)
    }

    pub fn charts(&mut self) -> &ChartRegistry {
        self.charts.refresh();
        &self.charts
    }

    /// Swap themes; charts are recreated with the new palette.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggle()?;
        self.charts.refresh();
        Ok(theme)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme> {
        let theme = self.theme.set(theme)?;
        self.charts.refresh();
        Ok(theme)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Render the current report as a downloadable artifact.
    pub fn render_export(&mut self, format: ExportFormat, assets: &ExportAssets) -> Result<ExportArtifact> {
        let report = self.report.as_ref().context("no report to export")?;
        let file_name = export::export_file_name(&report.file_name, format);

        let contents = match format {
            ExportFormat::Json => export::report_to_json(report)?,
            ExportFormat::Html => {
                let view = self.results_view().context("no report to export")?;
                export::html::render_report(
                    &view,
                    &self.charts,
                    self.theme.current(),
                    assets,
                    export::html::HtmlMode::Export,
                )
            }
        };

        Ok(ExportArtifact {
            file_name,
            format,
            contents,
        })
    }

    /// Render and write the current report into `dir`.
    pub fn export_to(&mut self, dir: &Path, format: ExportFormat, assets: &ExportAssets) -> Result<PathBuf> {
        let artifact = self.render_export(format, assets)?;
        export::write_artifact(dir, &artifact)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("file", &self.file.as_ref().map(|f| &f.file_name))
            .field("model", &self.model)
            .field("params", &self.params)
            .field("error", &self.error)
            .field("busy", &self.is_busy())
            .finish()
    }
}
