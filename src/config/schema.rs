/// Configuration schema and defaults for docinsight.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[ui]`, `[export]`, `[logging]` and `[web]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Maps directly to `~/.docinsight/config.toml` and `.docinsight.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocInsightConfig {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Remote analysis API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the analysis service.
    pub base_url: String,
    /// Path of the model catalog endpoint.
    pub models_path: String,
    /// Path of the document analysis endpoint.
    pub analyze_path: String,
    /// Model used when none is given on the command line. Empty means
    /// "first model in the catalog".
    pub default_model: String,
    /// Overall request timeout (seconds). Analyses of large documents are slow.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            models_path: "/api/v1/get-available-models".to_string(),
            analyze_path: "/api/v1/analyze-document".to_string(),
            default_model: String::new(),
            timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// [ui]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Persisted theme preference: `dark` or `light`.
    pub theme: Theme,
    /// Seconds an analysis must be pending before the cancel option appears.
    pub cancel_delay_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            cancel_delay_secs: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// [export]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory that receives exported reports.
    pub output_dir: String,
    /// CSS framework script referenced by exported HTML.
    pub css_framework_url: String,
    /// Web font stylesheet referenced by exported HTML.
    pub font_url: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            css_framework_url: "https://cdn.tailwindcss.com".to_string(),
            font_url: "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap"
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write the JSONL event log.
    pub enabled: bool,
    /// Event log location. Empty means `~/.docinsight/events.jsonl`.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address of the local report viewer.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl DocInsightConfig {
    /// Annotated default config file content, written by `docinsight config init`.
    pub fn default_toml() -> String {
        r#"# docinsight Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (DOCINSIGHT_*)
#   2. Project config (.docinsight.toml in current directory)
#   3. User global config (~/.docinsight/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000"
models_path = "/api/v1/get-available-models"
analyze_path = "/api/v1/analyze-document"
default_model = ""          # Empty: first model of the catalog
timeout_secs = 300

[ui]
theme = "dark"              # dark | light
cancel_delay_secs = 8       # Seconds before the cancel option is offered

[export]
output_dir = "."
css_framework_url = "https://cdn.tailwindcss.com"
font_url = "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap"

[logging]
enabled = true
path = ""                   # Empty: ~/.docinsight/events.jsonl

[web]
addr = "127.0.0.1:9747"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = DocInsightConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.api.timeout_secs, 300);
        assert!(config.api.default_model.is_empty());
        assert_eq!(config.ui.theme, Theme::Dark);
        assert_eq!(config.ui.cancel_delay_secs, 8);
        assert_eq!(config.export.output_dir, ".");
        assert!(config.logging.enabled);
        assert_eq!(config.web.addr, "127.0.0.1:9747");
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[ui]
theme = "light"
"#;
        let config: DocInsightConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ui.theme, Theme::Light);
        assert_eq!(config.ui.cancel_delay_secs, 8);
        assert_eq!(config.api.models_path, "/api/v1/get-available-models");
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: DocInsightConfig = toml::from_str("").unwrap();
        assert_eq!(config.ui.theme, Theme::Dark);
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: DocInsightConfig = toml::from_str(&DocInsightConfig::default_toml()).unwrap();
        assert_eq!(config.api.analyze_path, "/api/v1/analyze-document");
        assert_eq!(config.ui.theme, Theme::Dark);
        assert_eq!(config.web.addr, "127.0.0.1:9747");
    }
}
