//! Analysis report data model.
//!
//! A [`Report`] is the complete result for one analysed document: file
//! metadata, an executive summary and the list of typed [`Insight`] records.
//! Reports arrive either from the analysis API or from a previously exported
//! JSON file (see [`parse_report`]). A loaded report is never mutated; the
//! display order is derived by the view layer.

mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use validate::parse_report;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub file_name: String,
    #[serde(default)]
    pub file_type_detected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub executive_summary: String,
    pub insights: Vec<Insight>,
}

// ---------------------------------------------------------------------------
// Insight
// ---------------------------------------------------------------------------

/// One finding. Fields common to every insight type live here; the
/// type-specific payload is flattened in from [`InsightPayload`].
///
/// Only the report envelope is validated, so every common field has a
/// default and a partial insight still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub locations: Vec<LocationReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actionable_recommendation: Option<String>,
    #[serde(flatten)]
    pub details: InsightPayload,
}

impl Insight {
    /// The recognized insight type, read from the tag even when the
    /// payload itself did not decode.
    pub fn insight_type(&self) -> Option<InsightType> {
        match &self.details {
            InsightPayload::Typed(details) => Some(details.insight_type()),
            InsightPayload::Untyped(_) => InsightType::from_label(self.details.type_label()),
        }
    }

    /// Sentiment score for sentiment-type insights.
    pub fn sentiment_score(&self) -> Option<f64> {
        match &self.details {
            InsightPayload::Typed(InsightDetails::SentimentAnalysis { sentiment }) => {
                Some(sentiment.score)
            }
            _ => None,
        }
    }
}

/// Type-specific fields of an insight.
///
/// Payloads that match one of the known types decode into
/// [`InsightDetails`]. Anything else (an unknown `insight_type`, or a known
/// one with missing fields) is kept verbatim so it survives export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightPayload {
    Typed(InsightDetails),
    Untyped(Map<String, Value>),
}

impl InsightPayload {
    /// The `insight_type` text as reported; empty when absent.
    pub fn type_label(&self) -> &str {
        match self {
            Self::Typed(details) => details.insight_type().label(),
            Self::Untyped(fields) => fields
                .get("insight_type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }
}

impl From<InsightDetails> for InsightPayload {
    fn from(details: InsightDetails) -> Self {
        Self::Typed(details)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "insight_type")]
pub enum InsightDetails {
    #[serde(rename = "Quantitative Metric")]
    QuantitativeMetric {
        metric_name: String,
        /// Kept as the exact JSON number so integers stay integers on export.
        value: serde_json::Number,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    #[serde(rename = "Key Theme")]
    KeyTheme { keywords: Vec<String>, mentions: u64 },
    #[serde(rename = "Sentiment Analysis")]
    SentimentAnalysis { sentiment: SentimentResult },
    #[serde(rename = "Table Analysis")]
    TableAnalysis {
        summary: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_headers: Option<Vec<String>>,
    },
    #[serde(rename = "Code Analysis")]
    CodeAnalysis {
        summary: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        potential_issues: Option<Vec<String>>,
    },
}

impl InsightDetails {
    pub fn insight_type(&self) -> InsightType {
        match self {
            Self::QuantitativeMetric { .. } => InsightType::QuantitativeMetric,
            Self::KeyTheme { .. } => InsightType::KeyTheme,
            Self::SentimentAnalysis { .. } => InsightType::SentimentAnalysis,
            Self::TableAnalysis { .. } => InsightType::TableAnalysis,
            Self::CodeAnalysis { .. } => InsightType::CodeAnalysis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// `Positive`, `Negative`, `Neutral` or `Mixed` as produced by the API.
    pub label: String,
    /// From -1 (very negative) to +1 (very positive).
    pub score: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationReference {
    pub location: String,
}

// ---------------------------------------------------------------------------
// Insight type
// ---------------------------------------------------------------------------

/// The `insight_type` tag without its payload; used for filtering and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightType {
    QuantitativeMetric,
    KeyTheme,
    SentimentAnalysis,
    TableAnalysis,
    CodeAnalysis,
}

impl InsightType {
    pub const ALL: [Self; 5] = [
        Self::QuantitativeMetric,
        Self::KeyTheme,
        Self::SentimentAnalysis,
        Self::TableAnalysis,
        Self::CodeAnalysis,
    ];

    /// Wire label, e.g. `"Key Theme"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::QuantitativeMetric => "Quantitative Metric",
            Self::KeyTheme => "Key Theme",
            Self::SentimentAnalysis => "Sentiment Analysis",
            Self::TableAnalysis => "Table Analysis",
            Self::CodeAnalysis => "Code Analysis",
        }
    }

    /// Exact match against the wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordinal importance of an insight.
///
/// Values outside the five known levels are kept verbatim in `Other` so a
/// report survives an export/import round trip unchanged; they rank and
/// render as `Informational`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Informational,
    Other(String),
}

impl Severity {
    /// Fixed rank table: Critical=4 > High=3 > Medium=2 > Low=1 > Informational=0.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Informational | Self::Other(_) => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Informational => "Informational",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Critical" => Self::Critical,
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            "Informational" => Self::Informational,
            _ => Self::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn metric_json() -> &'static str {
        r#"{
            "title": "Quarterly revenue",
            "description": "Revenue grew against the prior quarter.",
            "insight_type": "Quantitative Metric",
            "severity": "High",
            "confidence_score": 0.9,
            "locations": [{"location": "Page 2"}],
            "metric_name": "Revenue",
            "value": 42,
            "unit": "M USD"
        }"#
    }

    #[test]
    fn deserializes_tagged_insight() {
        let insight: Insight = serde_json::from_str(metric_json()).unwrap();
        assert_eq!(insight.insight_type(), Some(InsightType::QuantitativeMetric));
        assert_eq!(insight.severity, Severity::High);
        assert_eq!(insight.locations[0].location, "Page 2");
        match insight.details {
            InsightPayload::Typed(InsightDetails::QuantitativeMetric { value, unit, .. }) => {
                assert_eq!(value.to_string(), "42");
                assert_eq!(unit.as_deref(), Some("M USD"));
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn integer_metric_value_survives_serialization() {
        let insight: Insight = serde_json::from_str(metric_json()).unwrap();
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["value"], serde_json::json!(42));
        assert_eq!(json["insight_type"], "Quantitative Metric");
    }

    #[test]
    fn unknown_severity_is_preserved_and_ranks_lowest() {
        let severity = Severity::from("Urgent".to_string());
        assert_eq!(severity, Severity::Other("Urgent".to_string()));
        assert_eq!(severity.rank(), 0);
        assert!(!severity.is_recognized());
        assert_eq!(String::from(severity), "Urgent");
    }

    #[test]
    fn severity_rank_table() {
        assert_eq!(Severity::Critical.rank(), 4);
        assert_eq!(Severity::High.rank(), 3);
        assert_eq!(Severity::Medium.rank(), 2);
        assert_eq!(Severity::Low.rank(), 1);
        assert_eq!(Severity::Informational.rank(), 0);
    }

    #[test]
    fn insight_type_labels_round_trip() {
        for kind in InsightType::ALL {
            assert_eq!(InsightType::from_label(kind.label()), Some(kind));
        }
        assert_eq!(InsightType::from_label("key theme"), None);
    }

    #[test]
    fn sentiment_score_only_for_sentiment_insights() {
        let sentiment: Insight = serde_json::from_str(
            r#"{
                "title": "Overall tone",
                "description": "The document reads as cautiously optimistic.",
                "insight_type": "Sentiment Analysis",
                "severity": "Informational",
                "confidence_score": 0.7,
                "sentiment": {"label": "Positive", "score": 0.4, "explanation": "Mostly upbeat wording."}
            }"#,
        )
        .unwrap();
        assert_eq!(sentiment.sentiment_score(), Some(0.4));
        assert!(sentiment.locations.is_empty());

        let metric: Insight = serde_json::from_str(metric_json()).unwrap();
        assert_eq!(metric.sentiment_score(), None);
    }

    #[test]
    fn unknown_insight_type_keeps_its_payload() {
        let json = r#"{
            "title": "Diagram",
            "description": "An architecture diagram.",
            "insight_type": "Image Analysis",
            "severity": "Low",
            "confidence_score": 0.5,
            "caption": "System overview"
        }"#;
        let insight: Insight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.insight_type(), None);
        assert_eq!(insight.details.type_label(), "Image Analysis");

        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["insight_type"], "Image Analysis");
        assert_eq!(value["caption"], "System overview");
    }

    #[test]
    fn partial_insight_loads_with_defaults() {
        let insight: Insight = serde_json::from_str(
            r#"{"title": "Themes", "insight_type": "Key Theme", "keywords": ["growth"]}"#,
        )
        .unwrap();
        assert_eq!(insight.confidence_score, 0.0);
        assert_eq!(insight.severity, Severity::Informational);
        assert!(insight.description.is_empty());
        // `mentions` is missing, so the payload stays raw but still filters as a theme.
        assert!(matches!(insight.details, InsightPayload::Untyped(_)));
        assert_eq!(insight.insight_type(), Some(InsightType::KeyTheme));
    }
}
