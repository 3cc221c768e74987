//! Configuration management for `GeoGuide`
//!
//! Settings are read once at startup from an optional TOML file, the process
//! environment (`GEOGUIDE_*`) and the variable names used by earlier
//! deployments, then validated. The resulting value is immutable.

use crate::GeoguideError;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `GEOGUIDE_LLM__API_KEY`
pub const ENV_PREFIX: &str = "GEOGUIDE";

/// Variable names from earlier deployments and the keys they feed
const LEGACY_ENV_VARS: [(&str, &str); 4] = [
    ("LLAMA_KEY", "llm.api_key"),
    ("LLAMA_DEPLOYMENT_VERSION", "llm.model"),
    ("AZURE_MAPS_KEY", "maps.subscription_key"),
    ("AZURE_ENDPOINT", "maps.endpoint"),
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoguideConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat-completion provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Places-search provider settings
    #[serde(default)]
    pub maps: MapsConfig,
    /// IP geolocation provider settings
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Chat-completion API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the chat-completion provider (required)
    pub api_key: Option<String>,
    /// Model / deployment identifier (required)
    pub model: Option<String>,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

/// Places-search API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// Subscription key (required)
    pub subscription_key: Option<String>,
    /// Service root, the POI search path is appended to it
    #[serde(default = "default_maps_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_maps_api_version")]
    pub api_version: String,
    /// Request timeout in seconds
    #[serde(default = "default_maps_timeout")]
    pub timeout_seconds: u64,
}

/// IP geolocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Lookup URL answering for the caller's own address
    #[serde(default = "default_geolocation_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_geolocation_timeout")]
    pub timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1/".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    300
}

fn default_top_p() -> f32 {
    1.0
}

fn default_maps_endpoint() -> String {
    "https://atlas.microsoft.com/".to_string()
}

fn default_maps_api_version() -> String {
    "1.0".to_string()
}

fn default_maps_timeout() -> u64 {
    15
}

fn default_geolocation_endpoint() -> String {
    "https://ipinfo.io/json".to_string()
}

fn default_geolocation_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: default_llm_base_url(),
            timeout_seconds: default_llm_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            subscription_key: None,
            endpoint: default_maps_endpoint(),
            api_version: default_maps_api_version(),
            timeout_seconds: default_maps_timeout(),
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geolocation_endpoint(),
            timeout_seconds: default_geolocation_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<redacted>" } else { "<unset>" }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl fmt::Debug for MapsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapsConfig")
            .field("subscription_key", &redact(&self.subscription_key))
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl MapsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl GeolocationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl GeoguideConfig {
    /// Load configuration from the default file location and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path and the environment
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        // A missing .env file is normal outside development
        let _ = dotenv::dotenv();

        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("geoguide.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        for (var, key) in LEGACY_ENV_VARS {
            builder = builder
                .set_override_option(key, std::env::var(var).ok())
                .with_context(|| format!("Failed to apply {var}"))?;
        }

        Self::from_builder(builder)
    }

    /// Load configuration from a TOML document only
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GeoguideConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geoguide").join("config.toml"))
    }

    /// Replace empty strings with defaults
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.maps.endpoint.is_empty() {
            self.maps.endpoint = default_maps_endpoint();
        }
        if self.maps.api_version.is_empty() {
            self.maps.api_version = default_maps_api_version();
        }
        if self.geolocation.endpoint.is_empty() {
            self.geolocation.endpoint = default_geolocation_endpoint();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate that every required credential is present
    pub fn validate_api_keys(&self) -> Result<()> {
        let required = [
            ("llm.api_key", &self.llm.api_key, "GEOGUIDE_LLM__API_KEY or LLAMA_KEY"),
            ("llm.model", &self.llm.model, "GEOGUIDE_LLM__MODEL or LLAMA_DEPLOYMENT_VERSION"),
            (
                "maps.subscription_key",
                &self.maps.subscription_key,
                "GEOGUIDE_MAPS__SUBSCRIPTION_KEY or AZURE_MAPS_KEY",
            ),
        ];

        for (key, value, env_hint) in required {
            match value {
                Some(v) if !v.trim().is_empty() => {}
                _ => {
                    return Err(GeoguideError::config(format!(
                        "Missing required setting '{key}'. Set it in the config file or via {env_hint}."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("LLM", self.llm.timeout_seconds),
            ("Maps", self.maps.timeout_seconds),
            ("Geolocation", self.geolocation.timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds == 0 {
                return Err(
                    GeoguideError::config(format!("{name} timeout must be positive")).into(),
                );
            }
            if seconds > 300 {
                return Err(
                    GeoguideError::config(format!("{name} timeout cannot exceed 300 seconds")).into(),
                );
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(GeoguideError::config("LLM temperature must be between 0 and 2").into());
        }

        if !(0.0..=1.0).contains(&self.llm.top_p) {
            return Err(GeoguideError::config("LLM top_p must be between 0 and 1").into());
        }

        if self.llm.max_tokens == 0 {
            return Err(GeoguideError::config("LLM max_tokens must be positive").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GeoguideError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GeoguideError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("LLM base URL", &self.llm.base_url),
            ("Maps endpoint", &self.maps.endpoint),
            ("Geolocation endpoint", &self.geolocation.endpoint),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    GeoguideError::config(format!("{name} must be a valid HTTP or HTTPS URL")).into(),
                );
            }
        }

        Ok(())
    }

    /// Listener address in `host:port` form
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
