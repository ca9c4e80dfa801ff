//! Application configuration for GuidePress.
//!
//! User config lives at `~/.guidepress/guidepress.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the file; each backend names the
//! environment variable that holds its secret.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GuideError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "guidepress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".guidepress";

// ---------------------------------------------------------------------------
// Config structs (matching guidepress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Research backend that produces the English source writeup.
    #[serde(default)]
    pub source: SourceConfig,

    /// Backend that rewrites the source into a Korean post.
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Wiki image lookup.
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Video thumbnail lookup.
    #[serde(default)]
    pub video: VideoConfig,

    /// Ghost publishing.
    #[serde(default)]
    pub ghost: GhostConfig,

    /// Publish-time scheduling for batch runs.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory guide markdown files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Build list file used by batch commands.
    #[serde(default = "default_build_list")]
    pub build_list: String,

    /// Seconds to wait between batch items.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Banner image prepended to every guide.
    #[serde(default = "default_header_image_url")]
    pub header_image_url: String,

    /// Directory for raw backend response snapshots. Empty disables them.
    #[serde(default)]
    pub snapshot_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            build_list: default_build_list(),
            delay_secs: default_delay_secs(),
            header_image_url: default_header_image_url(),
            snapshot_dir: String::new(),
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_build_list() -> String {
    "builds.txt".into()
}
fn default_delay_secs() -> u64 {
    30
}
fn default_header_image_url() -> String {
    "https://i.namu.wiki/i/YJ42aHyMq-6Ol1p8xL7l1n3ExMbVJtX5UsTu-x2whwmfH-Ae8vEqsyUZHaQjw6pJx4gKv2wKfGj3BLQ4wJfz_Mb4wtgBpye3pee0PX6I_472F0D6LOyQAJUhpqtWW02i6pRy5kRD__yO44e3ngLo5g.webp".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_source_endpoint")]
    pub endpoint: String,

    /// Model identifier.
    #[serde(default = "default_source_model")]
    pub model: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_source_key_env")]
    pub api_key_env: String,

    /// Per-request timeout.
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_source_endpoint(),
            model: default_source_model(),
            api_key_env: default_source_key_env(),
            timeout_secs: default_source_timeout(),
        }
    }
}

fn default_source_endpoint() -> String {
    "https://api.perplexity.ai/chat/completions".into()
}
fn default_source_model() -> String {
    "sonar-reasoning-pro".into()
}
fn default_source_key_env() -> String {
    "PERPLEXITY_API_KEY".into()
}
fn default_source_timeout() -> u64 {
    60
}

/// `[translator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    /// Model identifier.
    #[serde(default = "default_translator_model")]
    pub model: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_translator_key_env")]
    pub api_key_env: String,

    /// Per-request timeout.
    #[serde(default = "default_translator_timeout")]
    pub timeout_secs: u64,

    /// Completion length cap sent with each request.
    #[serde(default = "default_translator_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            model: default_translator_model(),
            api_key_env: default_translator_key_env(),
            timeout_secs: default_translator_timeout(),
            max_tokens: default_translator_max_tokens(),
        }
    }
}

fn default_translator_endpoint() -> String {
    "https://api.x.ai/v1/chat/completions".into()
}
fn default_translator_model() -> String {
    "grok-3-beta".into()
}
fn default_translator_key_env() -> String {
    "GROK_API_KEY".into()
}
fn default_translator_timeout() -> u64 {
    180
}
fn default_translator_max_tokens() -> u32 {
    4000
}

/// `[wiki]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Wiki origin; pages live under `{base_url}/wiki/`.
    #[serde(default = "default_wiki_base")]
    pub base_url: String,

    /// Fixed pause between consecutive lookups, in milliseconds.
    #[serde(default = "default_wiki_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_wiki_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on terms resolved per document.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: default_wiki_base(),
            rate_limit_ms: default_wiki_rate_limit(),
            timeout_secs: default_wiki_timeout(),
            max_terms: default_max_terms(),
        }
    }
}

fn default_wiki_base() -> String {
    "https://bg3.wiki".into()
}
fn default_wiki_rate_limit() -> u64 {
    800
}
fn default_wiki_timeout() -> u64 {
    30
}
fn default_max_terms() -> usize {
    30
}

/// `[video]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Whether to look up a video thumbnail at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Origin of the search results page.
    #[serde(default = "default_search_base")]
    pub search_base: String,

    /// Origin thumbnails are served from.
    #[serde(default = "default_thumbnail_base")]
    pub thumbnail_base: String,

    /// Number of video ids kept from a search page.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-request timeout.
    #[serde(default = "default_video_timeout")]
    pub timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_base: default_search_base(),
            thumbnail_base: default_thumbnail_base(),
            max_results: default_max_results(),
            timeout_secs: default_video_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_search_base() -> String {
    "https://www.youtube.com".into()
}
fn default_thumbnail_base() -> String {
    "https://img.youtube.com".into()
}
fn default_max_results() -> usize {
    3
}
fn default_video_timeout() -> u64 {
    10
}

/// `[ghost]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostConfig {
    /// Env var holding the Ghost site URL (e.g. `https://blog.example.com/ghost`).
    #[serde(default = "default_ghost_url_env")]
    pub api_url_env: String,

    /// Env var holding the `id:secret` admin API key.
    #[serde(default = "default_ghost_key_env")]
    pub admin_key_env: String,

    /// Post status for unscheduled posts: `draft` or `published`.
    #[serde(default = "default_post_status")]
    pub status: String,

    /// Tag attached to every batch post; also used to find published posts.
    #[serde(default = "default_batch_tag")]
    pub batch_tag: String,

    /// Per-request timeout.
    #[serde(default = "default_ghost_timeout")]
    pub timeout_secs: u64,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            api_url_env: default_ghost_url_env(),
            admin_key_env: default_ghost_key_env(),
            status: default_post_status(),
            batch_tag: default_batch_tag(),
            timeout_secs: default_ghost_timeout(),
        }
    }
}

fn default_ghost_url_env() -> String {
    "GHOST_ADMIN_API_URL".into()
}
fn default_ghost_key_env() -> String {
    "GHOST_ADMIN_API_KEY".into()
}
fn default_post_status() -> String {
    "draft".into()
}
fn default_batch_tag() -> String {
    "발더스게이트3".into()
}
fn default_ghost_timeout() -> u64 {
    30
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Posts published back to back before a long break.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Hours between posts inside one burst.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Extra hours between the last post of a burst and the next burst.
    #[serde(default = "default_break_hours")]
    pub break_hours: u64,

    /// When no start time is given, the first post goes out this many hours from now.
    #[serde(default = "default_lead_hours")]
    pub lead_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            interval_hours: default_interval_hours(),
            break_hours: default_break_hours(),
            lead_hours: default_lead_hours(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}
fn default_interval_hours() -> u64 {
    1
}
fn default_break_hours() -> u64 {
    24
}
fn default_lead_hours() -> u64 {
    1
}

// ---------------------------------------------------------------------------
// Runtime backend settings (merged from config sections)
// ---------------------------------------------------------------------------

/// Connection settings for one chat-completions backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Label used in logs (`source`, `translator`).
    pub label: String,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl From<&SourceConfig> for BackendConfig {
    fn from(config: &SourceConfig) -> Self {
        Self {
            label: "source".into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_tokens: None,
        }
    }
}

impl From<&TranslatorConfig> for BackendConfig {
    fn from(config: &TranslatorConfig) -> Self {
        Self {
            label: "translator".into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_tokens: Some(config.max_tokens),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.guidepress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| GuideError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.guidepress/guidepress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GuideError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GuideError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GuideError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| GuideError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GuideError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named environment variable.
///
/// Missing or empty values are a config error naming the variable.
pub fn read_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(GuideError::config(format!(
            "credential not found. Set the {var_name} environment variable (or add it to .env)."
        ))),
    }
}

/// Check that both generation backends have their API keys set.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    read_secret(&config.source.api_key_env)?;
    read_secret(&config.translator.api_key_env)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("PERPLEXITY_API_KEY"));
        assert!(toml_str.contains("GHOST_ADMIN_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.wiki.rate_limit_ms, 800);
        assert_eq!(parsed.schedule.batch_size, 10);
        assert_eq!(parsed.translator.max_tokens, 4000);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let toml_str = r#"
[translator]
model = "grok-4"

[schedule]
interval_hours = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.translator.model, "grok-4");
        assert_eq!(config.translator.api_key_env, "GROK_API_KEY");
        assert_eq!(config.schedule.interval_hours, 2);
        assert_eq!(config.schedule.break_hours, 24);
        assert_eq!(config.defaults.delay_secs, 30);
    }

    #[test]
    fn backend_config_from_sections() {
        let app = AppConfig::default();
        let source = BackendConfig::from(&app.source);
        assert_eq!(source.timeout, Duration::from_secs(60));
        assert!(source.max_tokens.is_none());

        let translator = BackendConfig::from(&app.translator);
        assert_eq!(translator.timeout, Duration::from_secs(180));
        assert_eq!(translator.max_tokens, Some(4000));
    }

    #[test]
    fn missing_secret_is_config_error() {
        let result = read_secret("GP_TEST_NONEXISTENT_KEY_12345");
        let err = result.unwrap_err();
        assert!(matches!(err, GuideError::Config { .. }));
        assert!(err.to_string().contains("GP_TEST_NONEXISTENT_KEY_12345"));
    }
}
