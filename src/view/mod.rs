//! Display model for the results view.
//!
//! [`filter_and_sort`] derives the displayed subset and order of insights
//! from the full report; [`ResultsView::build`] turns that into card display
//! models. Both are pure: the report is never reordered in place, and every
//! call rebuilds the cards from scratch.

pub mod card;

use std::cmp::Ordering;
use std::fmt;

use crate::report::{Insight, InsightType, Report};

pub use card::{
    CardDetail, ConfidenceBar, ConfidenceLevel, GroundingEvidence, InsightCard, SeverityBadge,
};

pub const NO_INSIGHTS_TITLE: &str = "No Insights Found";
pub const NO_INSIGHTS_MESSAGE: &str = "There are no insights matching the selected filter.";

// ---------------------------------------------------------------------------
// View parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(InsightType),
}

impl TypeFilter {
    /// Accepts `All`, an exact type label, or a short alias such as `sentiment`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        if let Some(kind) = InsightType::from_label(value) {
            return Some(Self::Only(kind));
        }

        let normalized = value.to_ascii_lowercase().replace(['-', '_'], " ");
        let kind = match normalized.as_str() {
            "quantitative metric" | "metric" | "quantitative" => InsightType::QuantitativeMetric,
            "key theme" | "theme" | "keywords" => InsightType::KeyTheme,
            "sentiment analysis" | "sentiment" => InsightType::SentimentAnalysis,
            "table analysis" | "table" => InsightType::TableAnalysis,
            "code analysis" | "code" => InsightType::CodeAnalysis,
            _ => return None,
        };
        Some(Self::Only(kind))
    }

    pub fn matches(self, insight: &Insight) -> bool {
        match self {
            Self::All => true,
            Self::Only(kind) => insight.insight_type() == Some(kind),
        }
    }

    /// Value used in query strings and selects.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(kind) => kind.label(),
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Report order.
    #[default]
    Default,
    Severity,
    Confidence,
}

impl SortKey {
    pub const ALL: [Self; 3] = [Self::Default, Self::Severity, Self::Confidence];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" | "none" => Some(Self::Default),
            "severity" => Some(Self::Severity),
            "confidence" => Some(Self::Confidence),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Severity => "severity",
            Self::Confidence => "confidence",
        }
    }

    fn compare(self, a: &Insight, b: &Insight) -> Ordering {
        match self {
            Self::Default => Ordering::Equal,
            Self::Severity => a.severity.rank().cmp(&b.severity.rank()),
            Self::Confidence => a
                .confidence_score
                .partial_cmp(&b.confidence_score)
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter, sort key and direction; the default is `All` / `default` / `desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub filter: TypeFilter,
    pub sort: SortKey,
    pub direction: SortDirection,
}

// ---------------------------------------------------------------------------
// Filter/sort engine
// ---------------------------------------------------------------------------

/// Filter by type, then stable-sort by the chosen key and direction.
///
/// Ties keep their report order, and [`SortKey::Default`] never reorders.
pub fn filter_and_sort<'a>(insights: &'a [Insight], params: &ViewParams) -> Vec<&'a Insight> {
    let mut shown: Vec<&Insight> = insights
        .iter()
        .filter(|insight| params.filter.matches(insight))
        .collect();

    if params.sort != SortKey::Default {
        shown.sort_by(|a, b| params.direction.apply(params.sort.compare(a, b)));
    }
    shown
}

// ---------------------------------------------------------------------------
// Results view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    /// `File: <name> (<detected type>)`.
    pub file_label: String,
    pub file_name: String,
    pub executive_summary: String,
    /// `Model: <model>`, absent when the report names no model.
    pub model_label: Option<String>,
    pub analysis_timestamp: Option<String>,
    pub params: ViewParams,
    pub total_insights: usize,
    pub cards: Vec<InsightCard>,
}

impl ResultsView {
    pub fn build(report: &Report, params: ViewParams) -> Self {
        let cards = filter_and_sort(&report.insights, &params)
            .into_iter()
            .enumerate()
            .map(|(position, insight)| InsightCard::build(insight, position))
            .collect();

        Self {
            file_label: format!(
                "File: {} ({})",
                report.file_name, report.file_type_detected
            ),
            file_name: report.file_name.clone(),
            executive_summary: report.executive_summary.clone(),
            model_label: report
                .model_used
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(|m| format!("Model: {m}")),
            analysis_timestamp: report.analysis_timestamp.clone(),
            params,
            total_insights: report.insights.len(),
            cards,
        }
    }

    /// True when the filter leaves nothing to show.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// `(chart id, score)` for every sentiment card, in display order.
    pub fn chart_entries(&self) -> Vec<(String, f64)> {
        self.cards.iter().filter_map(InsightCard::chart_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{InsightDetails, Severity};

    fn insight(title: &str, severity: Severity, confidence: f64) -> Insight {
        Insight {
            title: title.to_string(),
            description: String::new(),
            severity,
            confidence_score: confidence,
            locations: Vec::new(),
            representative_snippet: None,
            actionable_recommendation: None,
            details: InsightDetails::KeyTheme {
                keywords: vec!["growth".to_string()],
                mentions: 3,
            }
            .into(),
        }
    }

    fn titles(shown: &[&Insight]) -> Vec<String> {
        shown.iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn parses_filters_and_aliases() {
        assert_eq!(TypeFilter::parse("All"), Some(TypeFilter::All));
        assert_eq!(
            TypeFilter::parse("Key Theme"),
            Some(TypeFilter::Only(InsightType::KeyTheme))
        );
        assert_eq!(
            TypeFilter::parse("sentiment"),
            Some(TypeFilter::Only(InsightType::SentimentAnalysis))
        );
        assert_eq!(
            TypeFilter::parse("quantitative-metric"),
            Some(TypeFilter::Only(InsightType::QuantitativeMetric))
        );
        assert_eq!(TypeFilter::parse("images"), None);
    }

    #[test]
    fn confidence_sort_descending_by_default() {
        let insights = vec![
            insight("a", Severity::Low, 0.2),
            insight("b", Severity::Low, 0.9),
            insight("c", Severity::Low, 0.5),
        ];
        let params = ViewParams {
            sort: SortKey::Confidence,
            ..ViewParams::default()
        };
        assert_eq!(titles(&filter_and_sort(&insights, &params)), ["b", "c", "a"]);
    }

    #[test]
    fn unknown_severity_ranks_with_informational() {
        let insights = vec![
            insight("odd", Severity::Other("Urgent".into()), 0.5),
            insight("low", Severity::Low, 0.5),
            insight("info", Severity::Informational, 0.5),
        ];
        let params = ViewParams {
            sort: SortKey::Severity,
            direction: SortDirection::Asc,
            ..ViewParams::default()
        };
        assert_eq!(
            titles(&filter_and_sort(&insights, &params)),
            ["odd", "info", "low"]
        );
    }

    #[test]
    fn results_view_labels() {
        let report = Report {
            file_name: "q3.pdf".to_string(),
            file_type_detected: "PDF".to_string(),
            analysis_timestamp: None,
            model_used: Some("openai:gpt-4o".to_string()),
            executive_summary: "Summary".to_string(),
            insights: vec![insight("a", Severity::High, 0.7)],
        };
        let view = ResultsView::build(&report, ViewParams::default());
        assert_eq!(view.file_label, "File: q3.pdf (PDF)");
        assert_eq!(view.model_label.as_deref(), Some("Model: openai:gpt-4o"));
        assert_eq!(view.cards.len(), 1);
        assert!(view.chart_entries().is_empty());
    }
}
