//! Configuration management for the packing planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PackwiseError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackwiseConfig {
    /// Model-invocation service settings
    pub model: ModelConfig,
    /// Tool backends the model may call
    pub tools: ToolsConfig,
    /// Orchestration settings
    pub pipeline: PipelineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// Model-invocation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API, including the version segment
    pub base_url: String,
    /// Bearer token; omit for local servers that need none
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum tool-call rounds per generate call
    pub max_tool_rounds: u32,
}

/// Tool backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Open-Meteo geocoding API base URL
    pub geocoding_base_url: String,
    /// Open-Meteo forecast API base URL
    pub weather_base_url: String,
    /// HTTP request timeout in seconds for tool backends
    pub timeout_seconds: u32,
    /// Image search backend
    pub image_search: ImageSearchConfig,
}

/// Google Custom Search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Programmable search engine id (`cx`)
    pub engine_id: Option<String>,
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on a single stage's model call, in seconds
    pub stage_timeout_seconds: u32,
    /// Run checklist aggregation and hero image lookup concurrently
    pub parallel_finish: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP traces endpoint; tracing export is off when unset
    pub otlp_endpoint: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// Default value functions
fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_model_timeout() -> u32 {
    60
}

fn default_max_tool_rounds() -> u32 {
    5
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_tools_timeout() -> u32 {
    30
}

fn default_image_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_stage_timeout() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            api_key: None,
            model: default_model_name(),
            timeout_seconds: default_model_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            geocoding_base_url: default_geocoding_base_url(),
            weather_base_url: default_weather_base_url(),
            timeout_seconds: default_tools_timeout(),
            image_search: ImageSearchConfig::default(),
        }
    }
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_search_base_url(),
            api_key: None,
            engine_id: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: default_stage_timeout(),
            parallel_finish: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_seconds.into())
    }
}

impl PackwiseConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// `PACKWISE_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(PackwiseError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. PACKWISE_MODEL__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("PACKWISE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PackwiseConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("packwise").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.model.base_url.is_empty() {
            self.model.base_url = default_model_base_url();
        }
        if self.model.model.is_empty() {
            self.model.model = default_model_name();
        }
        if self.model.timeout_seconds == 0 {
            self.model.timeout_seconds = default_model_timeout();
        }
        if self.tools.geocoding_base_url.is_empty() {
            self.tools.geocoding_base_url = default_geocoding_base_url();
        }
        if self.tools.weather_base_url.is_empty() {
            self.tools.weather_base_url = default_weather_base_url();
        }
        if self.tools.timeout_seconds == 0 {
            self.tools.timeout_seconds = default_tools_timeout();
        }
        if self.tools.image_search.base_url.is_empty() {
            self.tools.image_search.base_url = default_image_search_base_url();
        }
        if self.pipeline.stage_timeout_seconds == 0 {
            self.pipeline.stage_timeout_seconds = default_stage_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.model.api_key {
            if api_key.trim().is_empty() {
                return Err(PackwiseError::config(
                    "Model API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        let search = &self.tools.image_search;
        if search.api_key.is_some() != search.engine_id.is_some() {
            return Err(PackwiseError::config(
                "Image search needs both an API key and an engine id",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.model.timeout_seconds > 600 {
            return Err(PackwiseError::config("Model timeout cannot exceed 600 seconds").into());
        }

        if self.model.max_tool_rounds > 20 {
            return Err(PackwiseError::config("Model max tool rounds cannot exceed 20").into());
        }

        if self.tools.timeout_seconds > 300 {
            return Err(PackwiseError::config("Tool timeout cannot exceed 300 seconds").into());
        }

        if self.pipeline.stage_timeout_seconds > 900 {
            return Err(PackwiseError::config("Stage timeout cannot exceed 900 seconds").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PackwiseError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PackwiseError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Model API base URL", Some(&self.model.base_url)),
            ("Geocoding API base URL", Some(&self.tools.geocoding_base_url)),
            ("Weather API base URL", Some(&self.tools.weather_base_url)),
            ("Image search base URL", Some(&self.tools.image_search.base_url)),
            ("OTLP endpoint", self.logging.otlp_endpoint.as_ref()),
        ];
        for (label, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(PackwiseError::config(format!(
                        "{label} must be a valid HTTP or HTTPS URL"
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PackwiseConfig::default();
        assert_eq!(config.model.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.tools.weather_base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.pipeline.stage_timeout(), Duration::from_secs(120));
        assert!(!config.pipeline.parallel_finish);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8080);
        assert!(config.model.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = PackwiseConfig::default();
        config.model.api_key = Some("  ".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_image_search_needs_both_credentials() {
        let mut config = PackwiseConfig::default();
        config.tools.image_search.api_key = Some("key".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine id"));

        config.tools.image_search.engine_id = Some("cx".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = PackwiseConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = PackwiseConfig::default();
        config.pipeline.stage_timeout_seconds = 5000;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_url_scheme() {
        let mut config = PackwiseConfig::default();
        config.logging.otlp_endpoint = Some("localhost:4318".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OTLP endpoint"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = PackwiseConfig::default();
        config.model.model = String::new();
        config.pipeline.stage_timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.pipeline.stage_timeout_seconds, 120);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[model]
base_url = "http://localhost:11434/v1"
model = "llama3.1"

[pipeline]
parallel_finish = true
stage_timeout_seconds = 45
"#
        )
        .unwrap();

        let config = PackwiseConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.model.model, "llama3.1");
        assert_eq!(config.model.timeout_seconds, 60);
        assert!(config.pipeline.parallel_finish);
        assert_eq!(config.pipeline.stage_timeout_seconds, 45);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = PackwiseConfig::load_from_path(Some(PathBuf::from("/nonexistent/packwise.toml")));
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = PackwiseConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("packwise"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
