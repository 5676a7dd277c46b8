//! Local report viewer for docinsight.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The interactive results page with filter/sort controls and theme toggle
//! - Report upload and JSON/HTML downloads
//! - JSON endpoints for the current report and the model catalog
//!
//! Launched via `docinsight serve` (default: `http://127.0.0.1:9747`).

mod api;

use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::logger::{self, EventAction, EventLogEntry, EventOutcome};
use crate::api::{AnalysisApi, HttpApiClient};
use crate::config;
use crate::export::ExportAssets;
use crate::export::html::{self, HtmlMode};
use crate::session::Session;
use crate::view::{SortDirection, SortKey, TypeFilter, ViewParams};

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the viewer serves from: one session, the export assets and
/// the API used for the model catalog.
pub struct Viewer {
    session: Session,
    assets: ExportAssets,
    api: Box<dyn AnalysisApi>,
}

impl Viewer {
    pub fn new(session: Session, assets: ExportAssets, api: Box<dyn AnalysisApi>) -> Self {
        Self {
            session,
            assets,
            api,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Load a report file before serving. Failures leave the banner set.
    pub fn open_report(&mut self, path: &Path) -> Result<()> {
        let result = self.session.load_report_file(path);
        log_load(&path.display().to_string(), &result);
        result.map_err(anyhow::Error::from)
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// `docinsight serve`: build a viewer from config and serve it.
pub fn run(report: Option<&Path>, addr: Option<&str>, open: bool) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or(&cfg.web.addr).to_string();

    let mut viewer = Viewer::new(
        crate::cli::build_session(&cfg),
        ExportAssets::from_config(&cfg.export),
        Box::new(HttpApiClient::from_config(&cfg.api)),
    );
    if let Some(path) = report
        && let Err(err) = viewer.open_report(path)
    {
        eprintln!("Could not open {}: {err}", path.display());
    }

    serve(&addr, &mut viewer, open)
}

/// Start the viewer on the given address.
///
/// Blocks the current thread. Handles requests sequentially (one local
/// user). Errors are reported per request without stopping the server.
pub fn serve(addr: &str, viewer: &mut Viewer, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("docinsight viewer running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let url = format!("http://{addr}");
        let _ = open_browser(&url);
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let reply = match read_body(&method, request.as_reader()) {
            Ok(body) => match viewer.dispatch(&method, &url, body.as_deref()) {
                Ok(reply) => reply,
                Err(e) => Reply::json_error(500, "error", &format!("{e:#}")),
            },
            Err(reply) => reply,
        };
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Read the body of a write request as text; a body that cannot be read
/// (including one that is not UTF-8) is answered with a 400 directly.
fn read_body(method: &Method, reader: &mut dyn Read) -> std::result::Result<Option<String>, Reply> {
    if !matches!(method, Method::Put | Method::Post | Method::Patch) {
        return Ok(None);
    }
    let mut buf = String::new();
    match reader.read_to_string(&mut buf) {
        Ok(_) => Ok(Some(buf)),
        Err(e) => Err(Reply::json_error(
            400,
            "detail",
            &format!("Could not read request body: {e}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

impl Viewer {
    /// Dispatch an incoming request to the appropriate handler.
    pub fn dispatch(&mut self, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));

        match (method, path) {
            (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(self.index(query)),
            (&Method::Post, "/theme/toggle") => self.toggle_theme(),

            (&Method::Get, "/api/report") => api::get_report(&self.session),
            (&Method::Post, "/api/report") => api::post_report(&mut self.session, body.unwrap_or("")),
            (&Method::Get, "/api/models") => api::get_models(self.api.as_ref()),

            (&Method::Get, "/download/json") => {
                api::download(&mut self.session, crate::export::ExportFormat::Json, &self.assets)
            }
            (&Method::Get, "/download/html") => {
                api::download(&mut self.session, crate::export::ExportFormat::Html, &self.assets)
            }

            _ => Ok(Reply::json_error(404, "error", "not found")),
        }
    }

    /// `GET /?filter=..&sort=..&dir=..`: results page, or the upload page
    /// while no report is loaded.
    fn index(&mut self, query: &str) -> Reply {
        let params = apply_query(self.session.params(), query);
        self.session.set_view_params(params);

        let theme = self.session.theme();
        let page = match self.session.results_view() {
            Some(view) => html::render_report(
                &view,
                self.session.charts(),
                theme,
                &self.assets,
                HtmlMode::Interactive,
            ),
            None => html::render_setup_page(theme, &self.assets, self.session.error()),
        };
        Reply::html(page)
    }

    /// `POST /theme/toggle`: flip and persist the theme, then redirect home.
    fn toggle_theme(&mut self) -> Result<Reply> {
        self.session
            .toggle_theme()
            .context("failed to toggle theme")?;
        Ok(Reply::redirect("/"))
    }
}

/// Overlay the recognized query parameters on the current view parameters.
/// Unknown values are ignored.
pub fn apply_query(mut params: ViewParams, query: &str) -> ViewParams {
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "filter" => {
                if let Some(filter) = TypeFilter::parse(&value) {
                    params.filter = filter;
                }
            }
            "sort" => {
                if let Some(sort) = SortKey::parse(&value) {
                    params.sort = sort;
                }
            }
            "dir" => {
                if let Some(direction) = SortDirection::parse(&value) {
                    params.direction = direction;
                }
            }
            _ => {}
        }
    }
    params
}

fn log_load(name: &str, result: &std::result::Result<(), crate::ClientError>) {
    let entry = match result {
        Ok(()) => EventLogEntry::new(EventAction::LoadReport, EventOutcome::Success),
        Err(err) => {
            EventLogEntry::new(EventAction::LoadReport, EventOutcome::Failed).detail(err.to_string())
        }
    };
    logger::log_event(&entry.file_name(name));
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub fn html(page: String) -> Self {
        Self::new(200, "text/html; charset=utf-8", page)
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, "application/json; charset=utf-8", value.to_string())
    }

    /// `{"<field>": message}` with the given status.
    pub fn json_error(status: u16, field: &str, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ field: message }))
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(303, "text/plain; charset=utf-8", Vec::new()).with_header("Location", location)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        for (name, value) in &self.headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
