//! JSON and download handlers for the report viewer.
//!
//! Each handler corresponds to an endpoint and returns a [`Reply`].
//! Client errors carry a `{"detail": ...}` body.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analytics::logger::{self, EventAction, EventLogEntry, EventOutcome};
use crate::api::AnalysisApi;
use crate::export::{ExportAssets, ExportFormat};
use crate::session::Session;

use super::{Reply, log_load};

const NO_REPORT: &str = "No report loaded.";

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Upload API response.
#[derive(Serialize)]
struct LoadedResponse<'a> {
    file_name: &'a str,
    insights: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Reply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Reply::new(200, "application/json; charset=utf-8", body))
}

fn detail(status: u16, message: &str) -> Reply {
    Reply::json_error(status, "detail", message)
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/report`: the loaded report as JSON.
pub fn get_report(session: &Session) -> Result<Reply> {
    match session.report() {
        Some(report) => json_response(report),
        None => Ok(detail(404, NO_REPORT)),
    }
}

/// `POST /api/report`: replace the current report with the uploaded one.
pub fn post_report(session: &mut Session, body: &str) -> Result<Reply> {
    let result = session.load_report_json(body);
    let name = session
        .report()
        .map(|r| r.file_name.clone())
        .unwrap_or_else(|| "upload".to_string());
    log_load(&name, &result);

    match result {
        Ok(()) => {
            let report = session.report().context("report vanished after load")?;
            json_response(&LoadedResponse {
                file_name: &report.file_name,
                insights: report.insights.len(),
            })
        }
        Err(err) => Ok(detail(400, &err.to_string())),
    }
}

/// `GET /api/models`: the analysis API's model catalog.
pub fn get_models(api: &dyn AnalysisApi) -> Result<Reply> {
    match api.fetch_models() {
        Ok(catalog) => json_response(&catalog),
        Err(err) => Ok(detail(502, &format!("Could not load models: {err}"))),
    }
}

/// `GET /download/{json,html}`: the report as an attachment.
pub fn download(session: &mut Session, format: ExportFormat, assets: &ExportAssets) -> Result<Reply> {
    let Some(name) = session.report().map(|r| r.file_name.clone()) else {
        return Ok(detail(404, NO_REPORT));
    };

    let result = session.render_export(format, assets);
    let outcome = if result.is_ok() {
        EventOutcome::Success
    } else {
        EventOutcome::Failed
    };
    logger::log_event(
        &EventLogEntry::new(EventAction::Export, outcome)
            .file_name(name)
            .detail(format.extension()),
    );

    let artifact = result?;
    Ok(
        Reply::new(200, artifact.format.content_type(), artifact.contents).with_header(
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", artifact.file_name),
        ),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
