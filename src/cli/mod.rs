//! CLI command implementations for docinsight.
//!
//! Provides subcommand handlers for:
//! - `docinsight models`: list the models offered by the analysis API
//! - `docinsight analyze FILE`: submit a document and show the insights
//! - `docinsight show REPORT`: render a previously exported report
//! - `docinsight export REPORT`: re-export a report as JSON or HTML
//! - `docinsight theme`: show, toggle or set the light/dark theme
//! - `docinsight history`: aggregate the activity log
//! - `docinsight config show|init|set|reset`: configuration management
//! - `docinsight shell` / `docinsight serve`: see [`shell`] and [`crate::web`]

pub mod input;
pub mod render;
pub mod shell;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{self, EventAction, EventLogEntry, EventOutcome};
use crate::analytics::reporter::{self, HistorySummary};
use crate::api::{self, AnalysisApi, DocumentUpload, HttpApiClient};
use crate::config::{self, DocInsightConfig};
use crate::export::{self, ExportAssets, ExportFormat};
use crate::session::{AnalysisOutcome, Session};
use crate::theme::{ConfigThemeStore, Theme, ThemeManager};
use crate::view::{SortDirection, SortKey, TypeFilter, ViewParams};

use input::LineInput;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Theme subcommand actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set(Theme),
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// A session whose theme is persisted in the global config.
pub fn build_session(cfg: &DocInsightConfig) -> Session {
    let theme = ThemeManager::initialize(Box::new(ConfigThemeStore));
    Session::new(theme, Duration::from_secs(cfg.ui.cancel_delay_secs))
}

/// Parse the `--filter`, `--sort` and `--asc` flags.
pub fn view_params(filter: Option<&str>, sort: Option<&str>, asc: bool) -> Result<ViewParams> {
    let filter = match filter {
        Some(value) => TypeFilter::parse(value)
            .with_context(|| format!("unknown insight type filter: '{value}'"))?,
        None => TypeFilter::All,
    };
    let sort = match sort {
        Some(value) => {
            SortKey::parse(value).with_context(|| format!("unknown sort key: '{value}'"))?
        }
        None => SortKey::Default,
    };
    let direction = if asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    Ok(ViewParams {
        filter,
        sort,
        direction,
    })
}

/// Resolve a model name against the catalog.
///
/// A requested model matching a catalog entry by value or display name is
/// replaced by its value; an unknown one is passed through as typed. With no
/// request, the configured default or the first catalog entry is used.
pub fn resolve_model(
    requested: Option<&str>,
    configured: &str,
    catalog: Option<&api::ModelCatalog>,
) -> Option<String> {
    let wanted = requested
        .filter(|m| !m.is_empty())
        .or(Some(configured).filter(|m| !m.is_empty()));

    match (wanted, catalog) {
        (Some(name), Some(catalog)) => Some(
            api::find_model(catalog, name)
                .map(|m| m.value.clone())
                .unwrap_or_else(|| name.to_string()),
        ),
        (Some(name), None) => Some(name.to_string()),
        (None, Some(catalog)) => api::first_model(catalog).map(|m| m.value.clone()),
        (None, None) => None,
    }
}

/// Record an analysis attempt in the activity log.
pub fn log_analysis(
    file_name: Option<&str>,
    model: Option<&str>,
    outcome: &AnalysisOutcome,
    elapsed: Duration,
) {
    let (event_outcome, insights, detail) = match outcome {
        AnalysisOutcome::Completed { insights } => (EventOutcome::Success, Some(*insights), None),
        AnalysisOutcome::Cancelled => (EventOutcome::Cancelled, None, None),
        AnalysisOutcome::Failed(message) | AnalysisOutcome::Rejected(message) => {
            (EventOutcome::Failed, None, Some(message.clone()))
        }
    };

    let mut entry = EventLogEntry::new(EventAction::Analyze, event_outcome)
        .model(model)
        .latency(elapsed);
    if let Some(name) = file_name {
        entry = entry.file_name(name);
    }
    if let Some(count) = insights {
        entry = entry.insights(count);
    }
    if let Some(detail) = detail {
        entry = entry.detail(detail);
    }
    logger::log_event(&entry);
}

fn log_report_load(path: &Path, result: &std::result::Result<(), crate::ClientError>) {
    let entry = match result {
        Ok(()) => EventLogEntry::new(EventAction::LoadReport, EventOutcome::Success),
        Err(err) => {
            EventLogEntry::new(EventAction::LoadReport, EventOutcome::Failed).detail(err.to_string())
        }
    };
    logger::log_event(&entry.file_name(path.display().to_string()));
}

fn log_export(file_name: &str, format: ExportFormat, ok: bool) {
    let outcome = if ok {
        EventOutcome::Success
    } else {
        EventOutcome::Failed
    };
    logger::log_event(
        &EventLogEntry::new(EventAction::Export, outcome)
            .file_name(file_name)
            .detail(format.extension()),
    );
}

/// Load a report file into a fresh session, logging the attempt.
fn session_with_report(cfg: &DocInsightConfig, path: &Path) -> Result<Session> {
    let mut session = build_session(cfg);
    let result = session.load_report_file(path);
    log_report_load(path, &result);
    if result.is_err() {
        anyhow::bail!(
            "{}",
            session.error().unwrap_or("Failed to load report.")
        );
    }
    Ok(session)
}

/// Write an export of the session's report and print where it went.
pub fn export_session(
    session: &mut Session,
    format: ExportFormat,
    dir: &Path,
    assets: &ExportAssets,
) -> Result<PathBuf> {
    let file_name = session
        .report()
        .map(|r| r.file_name.clone())
        .unwrap_or_default();
    let result = session.export_to(dir, format, assets);
    log_export(&file_name, format, result.is_ok());
    let path = result?;
    render::print_success(&format!("Exported {} report to {}", format, path.display()));
    Ok(path)
}

fn output_dir(cfg: &DocInsightConfig, out_dir: Option<PathBuf>) -> PathBuf {
    out_dir.unwrap_or_else(|| PathBuf::from(&cfg.export.output_dir))
}

// ---------------------------------------------------------------------------
// docinsight models
// ---------------------------------------------------------------------------

pub fn run_models(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = HttpApiClient::from_config(&cfg.api);
    let catalog = client
        .fetch_models()
        .context("could not load available models")?;

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&catalog).context("failed to serialize models")?;
            println!("{json}");
        }
        OutputFormat::Table => {
            let selected = resolve_model(None, &cfg.api.default_model, Some(&catalog));
            render::print_models(&catalog, selected.as_deref());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// docinsight analyze
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub file: PathBuf,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub params: ViewParams,
    pub json: bool,
    pub html: bool,
    pub out_dir: Option<PathBuf>,
}

/// Resolve the session's model against the live catalog.
///
/// Nothing is fetched until a key and a file are in place; the analysis
/// itself then rejects the incomplete input without any request.
fn choose_model(
    session: &mut Session,
    api: &dyn AnalysisApi,
    requested: Option<&str>,
    configured: &str,
) {
    if !session.can_analyze() {
        return;
    }
    let catalog = match api.fetch_models() {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            eprintln!("{} {}", "Could not load models:".yellow(), err);
            None
        }
    };
    session.set_model(resolve_model(requested, configured, catalog.as_ref()));
}

pub fn run_analyze(options: AnalyzeOptions) -> Result<()> {
    let cfg = config::load();
    let client = HttpApiClient::from_config(&cfg.api);
    let mut session = build_session(&cfg);

    session.set_api_key(options.api_key.unwrap_or_default());
    session.select_file(DocumentUpload::from_path(&options.file)?);

    choose_model(
        &mut session,
        &client,
        options.model.as_deref(),
        &cfg.api.default_model,
    );

    if let (Some(file), Some(model)) = (session.file(), session.model()) {
        println!(
            "{} {} {} {}",
            "Analyzing".cyan().bold(),
            file.file_name.bold(),
            "with".dimmed(),
            model
        );
    }

    let file_name = session.file().map(|f| f.file_name.clone());
    let model = session.model().map(str::to_string);

    let input = LineInput::spawn();
    let arm = input.cancel_arm();
    let started = Instant::now();
    let outcome = session.start_analysis(&client, arm.offer());
    arm.disarm();
    log_analysis(
        file_name.as_deref(),
        model.as_deref(),
        &outcome,
        started.elapsed(),
    );

    match outcome {
        AnalysisOutcome::Completed { .. } => {}
        AnalysisOutcome::Cancelled => {
            println!("{}", "Analysis cancelled.".yellow());
            return Ok(());
        }
        AnalysisOutcome::Failed(message) | AnalysisOutcome::Rejected(message) => {
            anyhow::bail!("{message}");
        }
    }

    session.set_view_params(options.params);
    if let Some(view) = session.results_view() {
        render::print_results(&view, session.charts());
    }

    let dir = output_dir(&cfg, options.out_dir);
    let assets = ExportAssets::from_config(&cfg.export);
    println!();
    if options.json {
        export_session(&mut session, ExportFormat::Json, &dir, &assets)?;
    }
    if options.html {
        export_session(&mut session, ExportFormat::Html, &dir, &assets)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// docinsight show / export
// ---------------------------------------------------------------------------

pub fn run_show(path: &Path, params: ViewParams, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut session = session_with_report(&cfg, path)?;

    match format {
        OutputFormat::Json => {
            let report = session.report().context("no report loaded")?;
            println!("{}", export::report_to_json(report)?);
        }
        OutputFormat::Table => {
            session.set_view_params(params);
            if let Some(view) = session.results_view() {
                render::print_results(&view, session.charts());
            }
        }
    }
    Ok(())
}

pub fn run_export(
    path: &Path,
    format: ExportFormat,
    params: ViewParams,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::load();
    let mut session = session_with_report(&cfg, path)?;
    session.set_view_params(params);

    let dir = output_dir(&cfg, out_dir);
    export_session(
        &mut session,
        format,
        &dir,
        &ExportAssets::from_config(&cfg.export),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// docinsight theme
// ---------------------------------------------------------------------------

pub fn run_theme(action: ThemeAction) -> Result<()> {
    let mut manager = ThemeManager::initialize(Box::new(ConfigThemeStore));

    let theme = match action {
        ThemeAction::Show => manager.current(),
        ThemeAction::Toggle => manager.toggle()?,
        ThemeAction::Set(theme) => manager.set(theme)?,
    };

    let icon = theme.icons().glyph();
    match action {
        ThemeAction::Show => println!("  {} {} {}", "Theme:".bold(), icon, theme),
        _ => render::print_success(&format!("Theme set to {icon} {theme}")),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// docinsight history
// ---------------------------------------------------------------------------

pub fn run_history(days: Option<u32>, format: OutputFormat) -> Result<()> {
    let summary = reporter::compute_history(days);

    if summary.total_analyses == 0 && summary.reports_loaded == 0 && summary.exports == 0 {
        println!(
            "{}",
            "No activity yet. Analyze a document to start the history.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&summary).context("failed to serialize history")?;
            println!("{json}");
        }
        OutputFormat::Table => print_history_table(&summary, days),
    }
    Ok(())
}

fn print_history_table(summary: &HistorySummary, days: Option<u32>) {
    let window = match days {
        Some(days) => format!("last {days} days"),
        None => "all time".to_string(),
    };
    println!(
        "{} {}",
        "docinsight Activity".bold().cyan(),
        format!("({window})").dimmed()
    );
    println!("{}", "=".repeat(60));
    println!();
    println!("  {} {}", "Analyses:      ".bold(), summary.total_analyses);
    println!(
        "  {} {} ok · {} failed · {} cancelled ({:.0}% success)",
        "Outcomes:      ".bold(),
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red(),
        summary.cancelled.to_string().yellow(),
        summary.success_pct()
    );
    println!("  {} {}", "Reports loaded:".bold(), summary.reports_loaded);
    println!("  {} {}", "Exports:       ".bold(), summary.exports);
    println!();

    if !summary.models.is_empty() {
        println!("{}", "By Model".bold().cyan());
        println!(
            "  {:<36} {:>6} {:>6} {:>12} {:>10}",
            "Model", "Runs", "OK", "Avg latency", "Avg ins."
        );
        println!("  {}", "-".repeat(74));
        for (i, stat) in summary.models.iter().enumerate() {
            let line = format!(
                "  {:<36} {:>6} {:>6} {:>10.1}s {:>10.1}",
                render::truncate(&stat.model, 36),
                stat.runs,
                stat.succeeded,
                stat.avg_latency_ms / 1000.0,
                stat.avg_insights
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
        println!();
    }

    if !summary.daily.is_empty() {
        println!("{}", "By Day".bold().cyan());
        for day in &summary.daily {
            let bar = "■".repeat(day.analyses.min(40));
            println!(
                "  {} {:>4} {}{}",
                day.date,
                day.analyses,
                bar.cyan(),
                if day.failures > 0 {
                    format!(" ({} failed)", day.failures).red().to_string()
                } else {
                    String::new()
                }
            );
        }
    }
}

// ---------------------------------------------------------------------------
// docinsight config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective docinsight Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global = config::global_config_file();
    let project = config::project_config_file();
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global.as_deref(), "~/.docinsight/config.toml");
    print_source(project.as_deref(), ".docinsight.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "DOCINSIGHT_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(path: Option<&Path>, label: &str) {
    if path.is_some_and(Path::exists) {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    render::print_success(&format!("Config written to {}", path.display()));
    println!("  {}", "Edit the file to point docinsight at your API.".dimmed());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    render::print_success(&format!("Config reset to defaults at {}", path.display()));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
