//! Process-wide settings: platform credentials from the environment plus optional
//! HTTP tuning from `coursekit.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use super::loader::read_config_file;
use crate::domain::AppError;

pub const API_URL_VAR: &str = "CANVAS_API_URL";
pub const API_KEY_VAR: &str = "CANVAS_API_KEY";
pub const DEFAULT_SETTINGS_FILE: &str = "coursekit.toml";

/// Connection settings handed to the HTTP client at construction.
#[derive(Clone)]
pub struct CanvasSettings {
    /// Platform base URL, always ending in `/`.
    pub api_url: Url,
    pub api_key: String,
    pub http: HttpSettings,
}

impl std::fmt::Debug for CanvasSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("http", &self.http)
            .finish()
    }
}

impl CanvasSettings {
    /// Build settings from the process environment.
    pub fn from_env(http: HttpSettings) -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok(), http)
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, http: HttpSettings) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = non_empty(lookup(API_URL_VAR));
        let api_key = non_empty(lookup(API_KEY_VAR));

        let (raw_url, api_key) = match (raw_url, api_key) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let missing: Vec<&str> =
                    [(API_URL_VAR, url.is_none()), (API_KEY_VAR, key.is_none())]
                        .into_iter()
                        .filter_map(|(name, missing)| missing.then_some(name))
                        .collect();
                return Err(AppError::config_error(format!(
                    "Canvas API settings not set: {} must be provided in the environment or .env",
                    missing.join(" and ")
                )));
            }
        };

        let api_url = parse_base_url(&raw_url)?;
        Ok(Self { api_url, api_key, http })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw).map_err(|e| {
        AppError::config_error(format!("{} is not a valid URL ('{}'): {}", API_URL_VAR, raw, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(AppError::config_error(format!(
            "{} must be an http(s) base URL, got '{}'",
            API_URL_VAR, raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Transport tuning read from the `[canvas]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// Total attempts per call, including the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay of the exponential backoff, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Page size for list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            per_page: default_per_page(),
        }
    }
}

impl HttpSettings {
    /// Check value ranges; `file` names the settings source in the error.
    pub fn validate(&self, file: &str) -> Result<(), AppError> {
        let problem = if self.request_timeout_seconds == 0 {
            "request_timeout_seconds must be greater than 0"
        } else if self.max_retries == 0 {
            "max_retries must be greater than 0"
        } else if self.retry_delay_ms == 0 {
            "retry_delay_ms must be greater than 0"
        } else if !(1..=100).contains(&self.per_page) {
            "per_page must be between 1 and 100"
        } else {
            return Ok(());
        };
        Err(AppError::invalid(file, problem))
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_per_page() -> u32 {
    100
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    canvas: HttpSettings,
}

/// Parse HTTP settings from TOML content read from `file`.
pub fn parse_http_settings(file: &str, content: &str) -> Result<HttpSettings, AppError> {
    let parsed: SettingsFile = toml::from_str(content)
        .map_err(|source| AppError::TomlParse { file: file.to_string(), source })?;
    parsed.canvas.validate(file)?;
    Ok(parsed.canvas)
}

/// Load HTTP settings.
///
/// An explicitly named file must exist; the default `coursekit.toml` in `dir` is optional.
pub fn load_http_settings(dir: &Path, explicit: Option<&Path>) -> Result<HttpSettings, AppError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = dir.join(DEFAULT_SETTINGS_FILE);
            if !path.exists() {
                return Ok(HttpSettings::default());
            }
            path
        }
    };
    parse_http_settings(&path.display().to_string(), &read_config_file(&path)?)
}
