use crate::report::{Insight, InsightDetails, InsightPayload, Severity};

/// Display model for one insight card.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightCard {
    /// Zero-based position in the displayed list.
    pub position: usize,
    pub title: String,
    pub severity: SeverityBadge,
    /// The reported `insight_type`, verbatim for unknown types.
    pub type_label: String,
    pub confidence: ConfidenceBar,
    pub description: String,
    pub detail: CardDetail,
    pub grounding: Option<GroundingEvidence>,
    pub recommendation: Option<String>,
    /// Set for sentiment cards, which carry a donut chart.
    pub chart_id: Option<String>,
    /// The first card and every critical card span two grid columns.
    pub wide: bool,
    pub animation_delay_ms: u64,
}

impl InsightCard {
    pub fn build(insight: &Insight, position: usize) -> Self {
        let detail = CardDetail::from_details(&insight.details);
        let chart_id = matches!(detail, CardDetail::Sentiment { .. })
            .then(|| format!("chart-{position}"));

        Self {
            position,
            title: insight.title.clone(),
            severity: SeverityBadge::for_severity(&insight.severity),
            type_label: insight.details.type_label().to_string(),
            confidence: ConfidenceBar::new(insight.confidence_score),
            description: insight.description.clone(),
            detail,
            grounding: insight
                .representative_snippet
                .as_ref()
                .map(|snippet| GroundingEvidence {
                    snippet: snippet.clone(),
                    locations: insight.locations.iter().map(|l| l.location.clone()).collect(),
                }),
            recommendation: insight.actionable_recommendation.clone(),
            chart_id,
            wide: position == 0 || insight.severity == Severity::Critical,
            animation_delay_ms: position as u64 * 100,
        }
    }

    pub fn chart_entry(&self) -> Option<(String, f64)> {
        match (&self.chart_id, &self.detail) {
            (Some(id), CardDetail::Sentiment { score, .. }) => Some((id.clone(), *score)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Severity badge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityBadge {
    /// The severity text as reported, including unrecognized values.
    pub label: String,
    pub classes: &'static str,
    pub tooltip: &'static str,
}

impl SeverityBadge {
    pub fn for_severity(severity: &Severity) -> Self {
        let (classes, tooltip) = match severity {
            Severity::Critical => (
                "bg-red-500/20 text-red-400 border-red-500/30",
                "Requires immediate attention.",
            ),
            Severity::High => (
                "bg-orange-500/20 text-orange-400 border-orange-500/30",
                "A significant finding.",
            ),
            Severity::Medium => (
                "bg-yellow-500/20 text-yellow-400 border-yellow-500/30",
                "A noteworthy finding.",
            ),
            Severity::Low => (
                "bg-blue-500/20 text-blue-400 border-blue-500/30",
                "A minor finding.",
            ),
            Severity::Informational => (INFORMATIONAL_CLASSES, "A general observation."),
            Severity::Other(_) => (INFORMATIONAL_CLASSES, "Severity level of this insight."),
        };
        Self {
            label: severity.as_str().to_string(),
            classes,
            tooltip,
        }
    }
}

const INFORMATIONAL_CLASSES: &str = "themed-chip-bg themed-text-secondary themed-border";

// ---------------------------------------------------------------------------
// Confidence bar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    Low,
    Mid,
    High,
}

impl ConfidenceLevel {
    pub fn for_score(score: f64) -> Self {
        if score < 0.5 {
            Self::Low
        } else if score < 0.8 {
            Self::Mid
        } else {
            Self::High
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Low => "bg-red-500",
            Self::Mid => "bg-yellow-500",
            Self::High => "bg-green-500",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBar {
    pub width_pct: f64,
    pub percent: i64,
    pub level: ConfidenceLevel,
}

impl ConfidenceBar {
    pub fn new(score: f64) -> Self {
        let width_pct = score * 100.0;
        Self {
            width_pct,
            percent: width_pct.round() as i64,
            level: ConfidenceLevel::for_score(score),
        }
    }
}

// ---------------------------------------------------------------------------
// Type-specific content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CardDetail {
    Metric {
        metric_name: String,
        value: String,
        unit: Option<String>,
    },
    Theme {
        keywords: Vec<String>,
        mentions: u64,
    },
    Sentiment {
        label: String,
        explanation: String,
        score: f64,
    },
    Table {
        summary: String,
        headers: Vec<String>,
    },
    Code {
        summary: String,
        language: Option<String>,
        potential_issues: Vec<String>,
    },
    /// Unknown or incomplete payload: the card has no detail block.
    Empty,
}

impl CardDetail {
    pub const SENTIMENT_HINT: &'static str =
        "A score from -1 (very negative) to +1 (very positive). The chart shows the % positivity.";

    fn from_details(payload: &InsightPayload) -> Self {
        let InsightPayload::Typed(details) = payload else {
            return Self::Empty;
        };
        match details {
            InsightDetails::QuantitativeMetric {
                metric_name,
                value,
                unit,
            } => Self::Metric {
                metric_name: metric_name.clone(),
                value: value.to_string(),
                unit: unit.clone().filter(|u| !u.is_empty()),
            },
            InsightDetails::KeyTheme { keywords, mentions } => Self::Theme {
                keywords: keywords.clone(),
                mentions: *mentions,
            },
            InsightDetails::SentimentAnalysis { sentiment } => Self::Sentiment {
                label: sentiment.label.clone(),
                explanation: sentiment.explanation.clone(),
                score: sentiment.score,
            },
            InsightDetails::TableAnalysis {
                summary,
                table_headers,
            } => Self::Table {
                summary: summary.clone(),
                headers: table_headers.clone().unwrap_or_default(),
            },
            InsightDetails::CodeAnalysis {
                summary,
                language,
                potential_issues,
            } => Self::Code {
                summary: summary.clone(),
                language: language.clone(),
                potential_issues: potential_issues.clone().unwrap_or_default(),
            },
        }
    }
}

/// Quoted snippet plus the location chips that ground it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingEvidence {
    pub snippet: String,
    pub locations: Vec<String>,
}
