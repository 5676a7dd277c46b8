//! Report export to JSON and standalone HTML files.
//!
//! Both formats are written as `analysis_report_<name>.<ext>`, where `<name>`
//! is the analysed document's name with every character outside
//! `[A-Za-z0-9_.-]` replaced by `_`.

pub mod html;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::schema::ExportConfig;
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// External stylesheet and font referenced by rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportAssets {
    pub css_framework_url: String,
    pub font_url: String,
}

impl ExportAssets {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            css_framework_url: config.css_framework_url.clone(),
            font_url: config.font_url.clone(),
        }
    }
}

impl Default for ExportAssets {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// A rendered export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub contents: String,
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Characters not allowed in exported file names.
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("file name regex must compile"));

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
/// An empty name becomes `file`.
pub fn sanitize_file_name(name: &str) -> String {
    if name.is_empty() {
        return "file".to_string();
    }
    UNSAFE_CHARS_RE.replace_all(name, "_").into_owned()
}

pub fn export_file_name(document_name: &str, format: ExportFormat) -> String {
    format!(
        "analysis_report_{}.{}",
        sanitize_file_name(document_name),
        format.extension()
    )
}

// ---------------------------------------------------------------------------
// Rendering and writing
// ---------------------------------------------------------------------------

/// The full report, pretty-printed with two-space indentation.
pub fn report_to_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}

/// Write `artifact` into `dir`, creating the directory if needed.
pub fn write_artifact(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(
            sanitize_file_name("Q3 Report (final)v2.pdf"),
            "Q3_Report__final_v2.pdf"
        );
        assert_eq!(sanitize_file_name("résumé.docx"), "r_sum_.docx");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn export_names_carry_extension() {
        assert_eq!(
            export_file_name("notes.txt", ExportFormat::Json),
            "analysis_report_notes.txt.json"
        );
        assert_eq!(
            export_file_name("", ExportFormat::Html),
            "analysis_report_file.html"
        );
    }

    #[test]
    fn parses_formats() {
        assert_eq!(ExportFormat::from_str_opt("HTML"), Some(ExportFormat::Html));
        assert_eq!(ExportFormat::from_str_opt("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str_opt("pdf"), None);
    }

    #[test]
    fn writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        let artifact = ExportArtifact {
            file_name: "analysis_report_a.json".to_string(),
            format: ExportFormat::Json,
            contents: "{}".to_string(),
        };
        let path = write_artifact(&target, &artifact).unwrap();
        assert_eq!(path, target.join("analysis_report_a.json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }
}
