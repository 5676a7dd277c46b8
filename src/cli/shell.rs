//! Interactive session: `docinsight shell`.
//!
//! One [`Session`] lives for the whole REPL. Setup commands (`key`, `file`,
//! `model`) fill in the inputs, `analyze` submits them, and the view commands
//! (`filter`, `sort`, `reverse`) reshape the visible results without touching
//! the report. While an analysis is pending, a bare Enter cancels it once the
//! cancel option has been offered.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;

use super::input::LineInput;
use super::{export_session, log_analysis, render, resolve_model};
use crate::analytics::logger::{self, EventAction, EventLogEntry, EventOutcome};
use crate::api::{AnalysisApi, DocumentUpload, HttpApiClient, ModelCatalog};
use crate::config::{self, DocInsightConfig};
use crate::export::{ExportAssets, ExportFormat};
use crate::session::{AnalysisOutcome, Session, UiState};
use crate::theme::Theme;
use crate::view::{SortKey, TypeFilter};

const HELP: &str = "\
Setup
  key <api-key>          Set the API key (empty clears it)
  file <path>            Select the document to analyze
  models                 Reload and list the available models
  model <name>           Select a model by value or name
  analyze                Submit the document (Enter cancels once offered)
  load <report.json>     Open a previously exported report

Results
  show                   Print the current results
  filter <type|all>      Show one insight type (metric, theme, sentiment, table, code)
  sort <key>             Sort by default, severity or confidence
  reverse                Flip the sort direction
  export <json|html> [dir]

Session
  theme [light|dark]     Toggle or set the theme
  status                 Show the current inputs and state
  reset                  Clear key, file and report
  help                   Show this help
  quit                   Leave the shell";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Empty,
    Help,
    Key(String),
    File(PathBuf),
    Models,
    Model(String),
    Analyze,
    Load(PathBuf),
    Show,
    Filter(TypeFilter),
    Sort(SortKey),
    Reverse,
    Export {
        format: ExportFormat,
        dir: Option<PathBuf>,
    },
    Theme(Option<Theme>),
    Status,
    Reset,
    Quit,
    /// Recognized command with bad arguments, or an unknown one.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "help" | "?" => Self::Help,
            "key" => Self::Key(rest.to_string()),
            "file" if !rest.is_empty() => Self::File(PathBuf::from(rest)),
            "file" => Self::Invalid("usage: file <path>".to_string()),
            "models" => Self::Models,
            "model" if !rest.is_empty() => Self::Model(rest.to_string()),
            "model" => Self::Invalid("usage: model <name>".to_string()),
            "analyze" | "run" => Self::Analyze,
            "load" if !rest.is_empty() => Self::Load(PathBuf::from(rest)),
            "load" => Self::Invalid("usage: load <report.json>".to_string()),
            "show" => Self::Show,
            "filter" => match TypeFilter::parse(if rest.is_empty() { "all" } else { rest }) {
                Some(filter) => Self::Filter(filter),
                None => Self::Invalid(format!("unknown insight type: '{rest}'")),
            },
            "sort" => match SortKey::parse(if rest.is_empty() { "default" } else { rest }) {
                Some(key) => Self::Sort(key),
                None => Self::Invalid(format!("unknown sort key: '{rest}'")),
            },
            "reverse" => Self::Reverse,
            "export" => parse_export(rest),
            "theme" if rest.is_empty() || rest.eq_ignore_ascii_case("toggle") => Self::Theme(None),
            "theme" => match Theme::parse(rest) {
                Some(theme) => Self::Theme(Some(theme)),
                None => Self::Invalid(format!("unknown theme: '{rest}'")),
            },
            "status" => Self::Status,
            "reset" => Self::Reset,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Invalid(format!("unknown command: '{other}' (try 'help')")),
        }
    }
}

fn parse_export(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    let format = parts.next().and_then(ExportFormat::from_str_opt);
    let dir = parts.next().map(PathBuf::from);
    match format {
        Some(format) => Command::Export { format, dir },
        None => Command::Invalid("usage: export <json|html> [dir]".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

pub fn run_shell(api_key: Option<String>) -> Result<()> {
    let cfg = config::load();
    let client = HttpApiClient::from_config(&cfg.api);
    let mut shell = Shell::new(cfg, client, api_key.unwrap_or_default());
    shell.run()
}

struct Shell {
    cfg: DocInsightConfig,
    client: HttpApiClient,
    session: Session,
    /// Key given at startup, restored after each reset.
    startup_key: String,
    catalog: Option<ModelCatalog>,
    assets: ExportAssets,
}

impl Shell {
    fn new(cfg: DocInsightConfig, client: HttpApiClient, startup_key: String) -> Self {
        let mut session = super::build_session(&cfg);
        session.set_api_key(startup_key.clone());
        let assets = ExportAssets::from_config(&cfg.export);
        Self {
            cfg,
            client,
            session,
            startup_key,
            catalog: None,
            assets,
        }
    }

    fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "docinsight shell".bold().cyan(),
            format!("(theme: {})", self.session.theme()).dimmed()
        );
        println!("{}", "Type 'help' for commands.".dimmed());
        self.load_models();

        let input = LineInput::spawn();
        loop {
            let prompt = format!("{} ", format!("docinsight[{}]>", self.session.state()).cyan());
            let Some(line) = input.read_line(&prompt) else {
                println!();
                break;
            };

            match Command::parse(&line) {
                Command::Quit => break,
                command => {
                    if let Err(err) = self.execute(command, &input) {
                        render::print_error_banner(&format!("{err:#}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, command: Command, input: &LineInput) -> Result<()> {
        match command {
            Command::Empty | Command::Quit => {}
            Command::Help => println!("{HELP}"),
            Command::Invalid(message) => anyhow::bail!("{message}"),
            Command::Key(key) => {
                let cleared = key.is_empty();
                self.session.set_api_key(key);
                render::print_success(if cleared { "API key cleared" } else { "API key set" });
            }
            Command::File(path) => {
                let upload = DocumentUpload::from_path(&path)?;
                render::print_success(&format!(
                    "Selected {} ({} bytes)",
                    upload.file_name,
                    upload.bytes.len()
                ));
                self.session.select_file(upload);
            }
            Command::Models => {
                self.load_models();
                if let Some(catalog) = &self.catalog {
                    render::print_models(catalog, self.session.model());
                }
            }
            Command::Model(name) => {
                let model = resolve_model(Some(&name), "", self.catalog.as_ref());
                self.session.set_model(model);
                if let Some(model) = self.session.model() {
                    render::print_success(&format!("Model set to {model}"));
                }
            }
            Command::Analyze => self.analyze(input),
            Command::Load(path) => self.load_report(&path)?,
            Command::Show => self.show(),
            Command::Filter(filter) => {
                self.require_results()?;
                self.session.set_filter(filter);
                self.show();
            }
            Command::Sort(key) => {
                self.require_results()?;
                self.session.set_sort(key);
                self.show();
            }
            Command::Reverse => {
                self.require_results()?;
                self.session.toggle_direction();
                self.show();
            }
            Command::Export { format, dir } => {
                self.require_results()?;
                let dir = dir.unwrap_or_else(|| PathBuf::from(&self.cfg.export.output_dir));
                export_session(&mut self.session, format, &dir, &self.assets)?;
            }
            Command::Theme(theme) => {
                let theme = match theme {
                    Some(theme) => self.session.set_theme(theme)?,
                    None => self.session.toggle_theme()?,
                };
                render::print_success(&format!("Theme set to {} {}", theme.icons().glyph(), theme));
            }
            Command::Status => self.status(),
            Command::Reset => {
                self.session.reset();
                self.session.set_api_key(self.startup_key.clone());
                render::print_success("Session reset");
            }
        }
        Ok(())
    }

    fn load_models(&mut self) {
        match self.client.fetch_models() {
            Ok(catalog) => {
                if self.session.model().is_none() {
                    self.session.set_model(resolve_model(
                        None,
                        &self.cfg.api.default_model,
                        Some(&catalog),
                    ));
                }
                self.catalog = Some(catalog);
            }
            Err(err) => {
                render::print_error_banner(&format!("Could not load models: {err}"));
                if self.session.model().is_none() && !self.cfg.api.default_model.is_empty() {
                    self.session
                        .set_model(Some(self.cfg.api.default_model.clone()));
                }
            }
        }
    }

    fn analyze(&mut self, input: &LineInput) {
        let file_name = self.session.file().map(|f| f.file_name.clone());
        let model = self.session.model().map(str::to_string);
        if let (Some(file), Some(model)) = (&file_name, &model) {
            println!("{} {} {} {}", "Analyzing".cyan().bold(), file.bold(), "with".dimmed(), model);
        }

        let arm = input.cancel_arm();
        let started = Instant::now();
        let outcome = self.session.start_analysis(&self.client, arm.offer());
        arm.disarm();
        input.discard_pending();

        if !matches!(outcome, AnalysisOutcome::Rejected(_)) {
            log_analysis(file_name.as_deref(), model.as_deref(), &outcome, started.elapsed());
        }

        match outcome {
            AnalysisOutcome::Completed { .. } => self.show(),
            AnalysisOutcome::Cancelled => {
                self.session.set_api_key(self.startup_key.clone());
                println!("{}", "Analysis cancelled.".yellow());
            }
            AnalysisOutcome::Failed(message) | AnalysisOutcome::Rejected(message) => {
                render::print_error_banner(&message);
            }
        }
    }

    fn load_report(&mut self, path: &std::path::Path) -> Result<()> {
        let result = self.session.load_report_file(path);
        let entry = match &result {
            Ok(()) => EventLogEntry::new(EventAction::LoadReport, EventOutcome::Success),
            Err(err) => EventLogEntry::new(EventAction::LoadReport, EventOutcome::Failed)
                .detail(err.to_string()),
        };
        logger::log_event(&entry.file_name(path.display().to_string()));

        if result.is_err() {
            let message = self.session.error().unwrap_or("Failed to load report.");
            anyhow::bail!("{message}");
        }
        self.show();
        Ok(())
    }

    fn show(&mut self) {
        let Some(view) = self.session.results_view() else {
            println!("{}", "No results yet. Run 'analyze' or 'load' first.".yellow());
            return;
        };
        println!();
        render::print_results(&view, self.session.charts());
        println!();
    }

    fn require_results(&self) -> Result<()> {
        if self.session.state() == UiState::Results {
            Ok(())
        } else {
            anyhow::bail!("no results yet; run 'analyze' or 'load' first")
        }
    }

    fn status(&self) {
        println!("{}", "Session".bold().cyan());
        render::print_state(self.session.state());
        render::print_status_item(
            "API key",
            self.session.has_api_key(),
            if self.session.has_api_key() { "set" } else { "missing" },
        );
        match self.session.file() {
            Some(file) => render::print_status_item(
                "Document",
                true,
                &format!("{} ({} bytes)", file.file_name, file.bytes.len()),
            ),
            None => render::print_status_item("Document", false, "none selected"),
        }
        match self.session.model() {
            Some(model) => render::print_status_item("Model", true, model),
            None => render::print_status_item("Model", false, "none selected"),
        }
        render::print_status_item(
            "Models",
            self.catalog.is_some(),
            if self.catalog.is_some() { "loaded" } else { "unavailable" },
        );
        if let Some(report) = self.session.report() {
            render::print_status_item(
                "Report",
                true,
                &format!("{} ({} insights)", report.file_name, report.insights.len()),
            );
        }
        println!(
            "  {} {} {}",
            "Theme:".bold(),
            self.session.theme().icons().glyph(),
            self.session.theme()
        );
        if let Some(error) = self.session.error() {
            render::print_error_banner(error);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
