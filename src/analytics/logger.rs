use std::fmt;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::config;

// ---------------------------------------------------------------------------
// Event log entry (JSONL)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Analyze,
    LoadReport,
    Export,
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analyze => "analyze",
            Self::LoadReport => "load_report",
            Self::Export => "export",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    Success,
    Failed,
    Cancelled,
}

impl fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A single line of `~/.docinsight/events.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: String,
    pub action: EventAction,
    pub outcome: EventOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Wall-clock time of the request (analyses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_count: Option<usize>,
    /// Error message or export format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EventLogEntry {
    pub fn new(action: EventAction, outcome: EventOutcome) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action,
            outcome,
            file_name: None,
            model: None,
            latency_ms: None,
            insight_count: None,
            detail: None,
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: Option<&str>) -> Self {
        self.model = model.map(str::to_string);
        self
    }

    pub fn latency(mut self, elapsed: Duration) -> Self {
        self.latency_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn insights(mut self, count: usize) -> Self {
        self.insight_count = Some(count);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append an entry to the event log when logging is enabled.
///
/// Best-effort: a failed write is reported on stderr and never affects the
/// action being logged.
pub fn log_event(entry: &EventLogEntry) {
    let cfg = config::load();
    if !cfg.logging.enabled {
        return;
    }
    if let Some(path) = event_log_path()
        && let Err(e) = log_event_to(&path, entry)
    {
        eprintln!("{} {e:#}", "warning: could not write event log:".yellow());
    }
}

pub(crate) fn log_event_to(path: &Path, entry: &EventLogEntry) -> Result<()> {
    append_entry(path, entry)
        .with_context(|| format!("failed to append to {}", path.display()))
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all entries from the event log.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries() -> Vec<EventLogEntry> {
    event_log_path()
        .map(|path| read_entries_from(&path))
        .unwrap_or_default()
}

/// Read log entries from the last `days` days, or all of them for `None`.
pub fn read_entries_since_days(days: Option<u32>) -> Vec<EventLogEntry> {
    filter_since_days(read_all_entries(), days)
}

pub fn read_entries_from(path: &Path) -> Vec<EventLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<EventLogEntry>(&line).ok())
        .collect()
}

pub(crate) fn filter_since_days(entries: Vec<EventLogEntry>, days: Option<u32>) -> Vec<EventLogEntry> {
    let Some(days) = days else {
        return entries;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn append_entry(path: &Path, entry: &EventLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// `logging.path` when set, otherwise `events.jsonl` in the data directory.
pub fn event_log_path() -> Option<PathBuf> {
    let cfg = config::load();
    if !cfg.logging.path.is_empty() {
        return Some(PathBuf::from(cfg.logging.path));
    }
    config::data_dir().map(|dir| dir.join("events.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");

        let ok = EventLogEntry::new(EventAction::Analyze, EventOutcome::Success)
            .file_name("q3.pdf")
            .model(Some("openai:gpt-4o"))
            .latency(Duration::from_millis(1500))
            .insights(7);
        let failed = EventLogEntry::new(EventAction::LoadReport, EventOutcome::Failed)
            .detail("Invalid report file format.");

        append_entry(&path, &ok).unwrap();
        append_entry(&path, &failed).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();

        let entries = read_entries_from(&path);
        assert_eq!(entries, vec![ok, failed]);
    }

    #[test]
    fn unwritable_log_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("events.jsonl");

        let entry = EventLogEntry::new(EventAction::Export, EventOutcome::Success);
        let err = log_event_to(&path, &entry).unwrap_err();
        assert!(format!("{err:#}").contains("failed to append to"));
        assert!(!path.exists());
    }

    #[test]
    fn serializes_compact_fields() {
        let entry = EventLogEntry::new(EventAction::Export, EventOutcome::Cancelled);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "export");
        assert_eq!(json["outcome"], "cancelled");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn day_window_drops_old_entries() {
        let mut old = EventLogEntry::new(EventAction::Analyze, EventOutcome::Success);
        old.timestamp = "2000-01-01T00:00:00+00:00".to_string();
        let recent = EventLogEntry::new(EventAction::Analyze, EventOutcome::Failed);

        let kept = filter_since_days(vec![old.clone(), recent.clone()], Some(7));
        assert_eq!(kept, vec![recent]);
        assert_eq!(filter_since_days(vec![old], None).len(), 1);
    }

    #[test]
    fn missing_log_reads_empty() {
        assert!(read_entries_from(Path::new("/definitely/not/here.jsonl")).is_empty());
    }
}
