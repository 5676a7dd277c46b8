use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use docinsight::cli::{self, AnalyzeOptions, OutputFormat, ThemeAction};
use docinsight::export::ExportFormat;
use docinsight::theme::Theme;
use docinsight::web;

#[derive(Debug, Parser)]
#[command(name = "docinsight")]
#[command(about = "Document analysis insights from the terminal")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

/// Filter and sort flags shared by the result views.
#[derive(Debug, Args)]
struct ViewArgs {
    /// Only show one insight type: metric, theme, sentiment, table, code
    #[arg(long)]
    filter: Option<String>,
    /// Sort key: default, severity, confidence
    #[arg(long)]
    sort: Option<String>,
    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,
}

impl ViewArgs {
    fn params(&self) -> Result<docinsight::view::ViewParams> {
        cli::view_params(self.filter.as_deref(), self.sort.as_deref(), self.asc)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the models offered by the analysis API
    Models {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Upload a document for analysis and print the insights
    Analyze {
        /// Document to analyze
        file: PathBuf,
        /// Model value or display name (default: config or first available)
        #[arg(long)]
        model: Option<String>,
        /// Bearer key for the analysis API
        #[arg(long, env = "DOCINSIGHT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[command(flatten)]
        view: ViewArgs,
        /// Also export the report as JSON
        #[arg(long)]
        json: bool,
        /// Also export the report as standalone HTML
        #[arg(long)]
        html: bool,
        /// Directory for exports (default: export.output_dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Render a previously exported JSON report
    Show {
        report: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Re-export a JSON report as JSON or HTML
    Export {
        report: PathBuf,
        /// Export format: html (default), json
        #[arg(long, default_value = "html")]
        format: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Directory for exports (default: export.output_dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Show, toggle or set the color theme
    Theme {
        /// show (default), toggle, set
        action: Option<String>,
        /// Theme for `set`: dark or light
        value: Option<String>,
    },
    /// Summarize past analyses from the activity log
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage docinsight configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Interactive session: select, analyze, filter and export
    Shell {
        /// Bearer key for the analysis API
        #[arg(long, env = "DOCINSIGHT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Serve a report viewer in the browser
    Serve {
        /// Report to open on startup
        report: Option<PathBuf>,
        /// Listen address (default: web.addr)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file to ~/.docinsight/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `api.base_url http://localhost:8000`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Models { format } => cli::run_models(OutputFormat::from_str_opt(Some(&format))),
        Commands::Analyze {
            file,
            model,
            api_key,
            view,
            json,
            html,
            out_dir,
        } => cli::run_analyze(AnalyzeOptions {
            file,
            model,
            api_key,
            params: view.params()?,
            json,
            html,
            out_dir,
        }),
        Commands::Show {
            report,
            view,
            format,
        } => cli::run_show(
            &report,
            view.params()?,
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Export {
            report,
            format,
            view,
            out_dir,
        } => {
            let format = ExportFormat::from_str_opt(&format)
                .with_context(|| format!("unknown export format: '{format}'"))?;
            cli::run_export(&report, format, view.params()?, out_dir)
        }
        Commands::Theme { action, value } => {
            cli::run_theme(parse_theme_action(action.as_deref(), value.as_deref())?)
        }
        Commands::History { days, format } => {
            cli::run_history(days, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Shell { api_key } => cli::shell::run_shell(api_key),
        Commands::Serve {
            report,
            addr,
            no_open,
        } => web::run(report.as_deref(), addr.as_deref(), !no_open),
    }
}

fn parse_theme_action(action: Option<&str>, value: Option<&str>) -> Result<ThemeAction> {
    match action {
        None | Some("show") => Ok(ThemeAction::Show),
        Some("toggle") => Ok(ThemeAction::Toggle),
        Some("set") => {
            let value = value.context("usage: docinsight theme set <dark|light>")?;
            Theme::parse(value)
                .map(ThemeAction::Set)
                .with_context(|| format!("unknown theme: '{value}'"))
        }
        // `docinsight theme light` is accepted as a shorthand for `set light`
        Some(other) => Theme::parse(other)
            .map(ThemeAction::Set)
            .with_context(|| format!("unknown theme action: '{other}'")),
    }
}
