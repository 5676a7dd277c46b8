/// Configuration system for docinsight.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::DocInsightConfig::default()`]
/// 2. **User global config**: `~/.docinsight/config.toml`
/// 3. **Project local config**: `.docinsight.toml` in the current directory
/// 4. **Environment variables**: `DOCINSIGHT_*` overrides (highest precedence)
///
/// The data directory (`~/.docinsight`) can be relocated with
/// `DOCINSIGHT_HOME`; the global config and the event log live there.
///
/// # Usage
///
/// ```rust,ignore
/// use docinsight::config;
///
/// let cfg = config::load();
/// let client = HttpApiClient::from_config(&cfg.api);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DocInsightConfig;

use crate::theme::Theme;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. This is the entry point for every module that needs configuration.
pub fn load() -> DocInsightConfig {
    let mut config = DocInsightConfig::default();

    // Layer 2: user global config
    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut config, &global);
    }

    // Layer 3: project local config (.docinsight.toml)
    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut config, &project);
    }

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never blocks a command.
fn load_toml_file(path: Option<PathBuf>) -> Option<DocInsightConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge a loaded config layer into the base config.
///
/// Each file is deserialized with `serde(default)`, so keys a user did not
/// set already carry the built-in defaults; the overlay therefore replaces
/// the base wholesale.
fn merge_config(base: &mut DocInsightConfig, overlay: &DocInsightConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding the global config and the event log.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCINSIGHT_HOME")
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".docinsight"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".docinsight.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `DOCINSIGHT_API_URL`: analysis service base URL
/// - `DOCINSIGHT_MODEL`: default model
/// - `DOCINSIGHT_THEME`: `dark` or `light`
/// - `DOCINSIGHT_CANCEL_DELAY_SECS`: cancel option delay
/// - `DOCINSIGHT_LOGGING`: event log on/off (`1`/`true`/`yes`/`on`)
/// - `DOCINSIGHT_WEB_ADDR`: report viewer listen address
fn apply_env_overrides(config: &mut DocInsightConfig) {
    if let Ok(val) = std::env::var("DOCINSIGHT_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("DOCINSIGHT_MODEL")
        && !val.is_empty()
    {
        config.api.default_model = val;
    }
    if let Ok(val) = std::env::var("DOCINSIGHT_THEME")
        && let Some(theme) = Theme::parse(&val)
    {
        config.ui.theme = theme;
    }
    if let Ok(val) = std::env::var("DOCINSIGHT_CANCEL_DELAY_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.ui.cancel_delay_secs = secs;
    }
    if let Ok(val) = std::env::var("DOCINSIGHT_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("DOCINSIGHT_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to the global config path.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(&path, DocInsightConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key (dotted, e.g. `ui.theme`) in the global config file.
///
/// Starts from the existing file, or from the serialized defaults when no
/// file exists yet, so unrelated keys are preserved.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DocInsightConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = &mut *root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type already stored under this key
    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        _ => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);

    // Reject values the schema cannot load back (e.g. `ui.theme = "blue"`)
    let candidate = toml::to_string(&*root).context("failed to serialize updated config")?;
    toml::from_str::<DocInsightConfig>(&candidate)
        .with_context(|| format!("invalid value for '{key}': '{raw_value}'"))?;

    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
