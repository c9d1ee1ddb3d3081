use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::retry::RetryConfig;

/// Environment variable that overrides `records.api_key`.
pub const RECORDS_KEY_ENV: &str = "AGROCAST_RECORDS_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Prediction and assistant backend
    pub api: ApiConfig,

    /// Forward geocoding (city name to coordinates)
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Where plans, tasks and chat messages live
    #[serde(default)]
    pub records: RecordsConfig,

    /// Backoff policy for idempotent HTTP calls
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base origin of the prediction/assistant backend
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim search endpoint
    pub search_url: String,

    /// Appended to every query as `"{city},{suffix}"`
    pub country_suffix: String,

    /// Nominatim requires an identifying user agent
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            search_url: "https://nominatim.openstreetmap.org/search".to_string(),
            country_suffix: "Vietnam".to_string(),
            user_agent: "AgroCast/0.1.0".to_string(),
        }
    }
}

/// Record store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordBackend {
    /// Local SQLite database (default)
    #[default]
    Sqlite,
    /// Hosted PostgREST / Supabase REST API
    Postgrest,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecordsConfig {
    #[serde(default)]
    pub backend: RecordBackend,

    /// SQLite file; defaults to `<config_dir>/agrocast.db`
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// Project URL for the PostgREST backend, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub postgrest_url: String,

    /// Anon/service key for the PostgREST backend
    #[serde(default)]
    pub api_key: Option<String>,
}

impl RecordsConfig {
    /// Resolve the SQLite path relative to the config directory.
    pub fn sqlite_path(&self, config_dir: &Path) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| config_dir.join("agrocast.db"))
    }

    /// API key from the environment, falling back to the config file.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var(RECORDS_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: crate::retry::DEFAULT_MAX_RETRIES,
            initial_delay_ms: crate::retry::DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: crate::retry::DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.initial_delay_ms, self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Persisted as the bot reply when the assistant cannot be reached
    pub fallback_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            fallback_message:
                "Sorry, I can't reach the assistant right now. Please try again in a moment."
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// City selected at startup
    pub default_city: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_city: "Da Nang".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agrocast");

        Self {
            config_dir,
            api: ApiConfig::default(),
            geocoding: GeocodingConfig::default(),
            records: RecordsConfig::default(),
            retry: RetrySettings::default(),
            chat: ChatConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, writing defaults there when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// [`load_validated`](Self::load_validated) for an explicit path
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);
        self.validate_url(
            &self.geocoding.search_url,
            "geocoding.search_url",
            &mut result,
        );

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        } else if self.api.timeout_secs > 300 {
            result.add_warning("api.timeout_secs", "Timeout is unusually long (>300s)");
        }

        if self.geocoding.user_agent.trim().is_empty() {
            result.add_error(
                "geocoding.user_agent",
                "Nominatim requires a non-empty user agent",
            );
        }

        if self.records.backend == RecordBackend::Postgrest {
            self.validate_url(
                &self.records.postgrest_url,
                "records.postgrest_url",
                &mut result,
            );
            if self.records.effective_api_key().is_none() {
                result.add_warning(
                    "records.api_key",
                    format!("No API key configured (set {})", RECORDS_KEY_ENV),
                );
            }
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            result.add_warning(
                "retry.initial_delay_ms",
                "Initial delay exceeds max delay; every retry waits max_delay_ms",
            );
        }

        if self.chat.fallback_message.trim().is_empty() {
            result.add_error("chat.fallback_message", "Fallback message cannot be empty");
        }

        if self.dashboard.default_city.trim().is_empty() {
            result.add_error("dashboard.default_city", "Default city cannot be empty");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("agrocast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_api_url() {
        let mut config = Config::default();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.geocoding.search_url = "ftp://nominatim.example".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_postgrest_backend_requires_url() {
        let mut config = Config::default();
        config.records.backend = RecordBackend::Postgrest;
        config.records.postgrest_url = String::new();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "records.postgrest_url"));
    }

    #[test]
    fn test_empty_default_city_is_error() {
        let mut config = Config::default();
        config.dashboard.default_city = "  ".to_string();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_load_from_writes_defaults_then_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let second = Config::load_from(&path).unwrap();
        assert_eq!(first.api.base_url, second.api.base_url);
        assert_eq!(second.dashboard.default_city, "Da Nang");
        assert_eq!(second.records.backend, RecordBackend::Sqlite);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/agrocast\"\n\n[api]\nbase_url = \"http://backend:9000\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.geocoding.country_suffix, "Vietnam");
        assert_eq!(
            config.records.sqlite_path(&config.config_dir),
            PathBuf::from("/tmp/agrocast/agrocast.db")
        );
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
