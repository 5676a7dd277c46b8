use serde_json::Value;

use super::Report;
use crate::error::ClientError;

const INVALID_FORMAT: &str = "Invalid report file format.";

/// Parse and validate an uploaded report document.
///
/// The document must be JSON with a non-empty `file_name`, a non-empty
/// `executive_summary` and an `insights` array. Individual insights are not
/// checked beyond that. Every failure is a [`ClientError::Validation`].
pub fn parse_report(text: &str) -> Result<Report, ClientError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ClientError::Validation(format!("invalid JSON: {e}")))?;

    if !has_required_fields(&value) {
        return Err(ClientError::Validation(INVALID_FORMAT.to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| ClientError::Validation(format!("{INVALID_FORMAT} {e}")))
}

fn has_required_fields(value: &Value) -> bool {
    let non_empty = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };

    non_empty("file_name")
        && non_empty("executive_summary")
        && value.get("insights").is_some_and(Value::is_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::InsightType;

    #[test]
    fn accepts_minimal_report() {
        let report = parse_report(
            r#"{"file_name": "a.txt", "executive_summary": "Short summary of the file.", "insights": []}"#,
        )
        .unwrap();
        assert_eq!(report.file_name, "a.txt");
        assert!(report.insights.is_empty());
        assert_eq!(report.model_used, None);
    }

    #[test]
    fn rejects_missing_insights_array() {
        let err = parse_report(
            r#"{"file_name": "a.txt", "executive_summary": "Summary", "insights": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.to_string(), INVALID_FORMAT);
    }

    #[test]
    fn rejects_empty_file_name() {
        let err = parse_report(
            r#"{"file_name": "", "executive_summary": "Summary", "insights": []}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), INVALID_FORMAT);
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_report("not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn accepts_mixed_known_and_unknown_insight_types() {
        let report = parse_report(
            r#"{
                "file_name": "a.txt",
                "executive_summary": "Summary",
                "insights": [
                    {
                        "title": "Growth",
                        "description": "Growth is a recurring theme.",
                        "insight_type": "Key Theme",
                        "severity": "Medium",
                        "confidence_score": 0.8,
                        "keywords": ["growth"],
                        "mentions": 4
                    },
                    {
                        "title": "Mystery",
                        "description": "Something else entirely.",
                        "insight_type": "Image Analysis",
                        "severity": "Low"
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(report.insights.len(), 2);
        assert_eq!(report.insights[0].insight_type(), Some(InsightType::KeyTheme));
        assert_eq!(report.insights[1].insight_type(), None);
        assert_eq!(report.insights[1].confidence_score, 0.0);
    }
}
