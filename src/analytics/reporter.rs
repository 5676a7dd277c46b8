//! Aggregation of the event log for `docinsight history`.
//!
//! - **Totals**: attempts per outcome
//! - **Models**: runs, average latency and average insight count per model
//! - **Daily**: analyses per day

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::logger::{self, EventAction, EventLogEntry, EventOutcome};

// ---------------------------------------------------------------------------
// Aggregated history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Analyses attempted (loads and exports are counted separately).
    pub total_analyses: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub reports_loaded: usize,
    pub exports: usize,
    pub models: Vec<ModelStat>,
    pub daily: Vec<DailyActivity>,
}

impl HistorySummary {
    /// Share of analyses that succeeded, in percent.
    pub fn success_pct(&self) -> f64 {
        if self.total_analyses == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total_analyses as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStat {
    pub model: String,
    pub runs: usize,
    pub succeeded: usize,
    pub avg_latency_ms: f64,
    /// Average over successful runs.
    pub avg_insights: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub analyses: usize,
    pub failures: usize,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Aggregate the log, optionally limited to the last `days` days.
pub fn compute_history(days: Option<u32>) -> HistorySummary {
    summarize(&logger::read_entries_since_days(days))
}

pub fn summarize(entries: &[EventLogEntry]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    let mut by_model: BTreeMap<String, Vec<&EventLogEntry>> = BTreeMap::new();
    let mut by_day: BTreeMap<String, DailyActivity> = BTreeMap::new();

    for entry in entries {
        match entry.action {
            EventAction::LoadReport => {
                if entry.outcome == EventOutcome::Success {
                    summary.reports_loaded += 1;
                }
                continue;
            }
            EventAction::Export => {
                if entry.outcome == EventOutcome::Success {
                    summary.exports += 1;
                }
                continue;
            }
            EventAction::Analyze => {}
        }

        summary.total_analyses += 1;
        match entry.outcome {
            EventOutcome::Success => summary.succeeded += 1,
            EventOutcome::Failed => summary.failed += 1,
            EventOutcome::Cancelled => summary.cancelled += 1,
        }

        let model = entry.model.clone().unwrap_or_else(|| "unknown".to_string());
        by_model.entry(model).or_default().push(entry);

        // RFC 3339 timestamps start with YYYY-MM-DD
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        let day = by_day.entry(date.clone()).or_insert(DailyActivity {
            date,
            analyses: 0,
            failures: 0,
        });
        day.analyses += 1;
        if entry.outcome == EventOutcome::Failed {
            day.failures += 1;
        }
    }

    let mut models: Vec<ModelStat> = by_model
        .into_iter()
        .map(|(model, group)| model_stat(model, &group))
        .collect();
    models.sort_by(|a, b| b.runs.cmp(&a.runs).then_with(|| a.model.cmp(&b.model)));

    summary.models = models;
    summary.daily = by_day.into_values().collect();
    summary
}

fn model_stat(model: String, group: &[&EventLogEntry]) -> ModelStat {
    let latencies: Vec<u64> = group.iter().filter_map(|e| e.latency_ms).collect();
    let successes: Vec<&&EventLogEntry> = group
        .iter()
        .filter(|e| e.outcome == EventOutcome::Success)
        .collect();
    let insight_counts: Vec<usize> = successes.iter().filter_map(|e| e.insight_count).collect();

    ModelStat {
        model,
        runs: group.len(),
        succeeded: successes.len(),
        avg_latency_ms: average(latencies.iter().map(|&ms| ms as f64)),
        avg_insights: average(insight_counts.iter().map(|&n| n as f64)),
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
