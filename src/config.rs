//! Configuration management for Marketa
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MarketaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for Marketa
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hosted backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Assistant exchange settings
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Hosted backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted service (REST, auth and functions live under it)
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Public API key sent with every request
    #[serde(default)]
    pub anon_key: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Which assistant protocol to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Insert a prompt row and poll it for the externally written response
    #[default]
    Polling,
    /// Stream the reply from the generation endpoint
    Streaming,
}

impl AssistantMode {
    /// Parse a mode from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::config::AssistantMode;
    ///
    /// assert_eq!(AssistantMode::parse_str("Streaming").unwrap(), AssistantMode::Streaming);
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "streaming" | "stream" => Ok(Self::Streaming),
            other => Err(format!("Unknown assistant mode: {}", other)),
        }
    }
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Streaming => write!(f, "streaming"),
        }
    }
}

/// Assistant exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Protocol used for each turn
    #[serde(default)]
    pub mode: AssistantMode,

    /// Delay between polling attempts (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of polling attempts before a turn times out
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Streaming endpoint; defaults to the campaign chat function
    #[serde(default)]
    pub stream_url: Option<String>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            mode: AssistantMode::default(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            stream_url: None,
        }
    }
}

impl AssistantConfig {
    /// Delay between polling attempts
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MarketaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MarketaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("MARKETA_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Ok(key) = std::env::var("MARKETA_ANON_KEY") {
            self.backend.anon_key = key;
        }

        if let Ok(timeout) = std::env::var("MARKETA_REQUEST_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(value) => self.backend.request_timeout_seconds = value,
                Err(_) => tracing::warn!("Invalid MARKETA_REQUEST_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(mode) = std::env::var("MARKETA_ASSISTANT_MODE") {
            match AssistantMode::parse_str(&mode) {
                Ok(value) => self.assistant.mode = value,
                Err(_) => tracing::warn!(
                    "Invalid assistant mode: {}, keeping {}",
                    mode,
                    self.assistant.mode
                ),
            }
        }

        if let Ok(interval) = std::env::var("MARKETA_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(value) => self.assistant.poll_interval_ms = value,
                Err(_) => tracing::warn!("Invalid MARKETA_POLL_INTERVAL_MS: {}", interval),
            }
        }

        if let Ok(attempts) = std::env::var("MARKETA_MAX_POLL_ATTEMPTS") {
            match attempts.parse() {
                Ok(value) => self.assistant.max_poll_attempts = value,
                Err(_) => tracing::warn!("Invalid MARKETA_MAX_POLL_ATTEMPTS: {}", attempts),
            }
        }

        if let Ok(stream_url) = std::env::var("MARKETA_STREAM_URL") {
            tracing::debug!(stream_url = %stream_url, "Env override: MARKETA_STREAM_URL");
            self.assistant.stream_url = Some(stream_url);
        }
    }

    /// Streaming endpoint, falling back to the campaign chat function
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.backend.url = "https://demo.example/".to_string();
    /// assert_eq!(config.stream_url(), "https://demo.example/functions/v1/campaign-chat");
    /// ```
    pub fn stream_url(&self) -> String {
        match &self.assistant.stream_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/functions/v1/campaign-chat",
                self.backend.url.trim_end_matches('/')
            ),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.is_empty() {
            return Err(MarketaError::Config("backend.url cannot be empty".to_string()).into());
        }

        if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://") {
            return Err(MarketaError::Config(format!(
                "backend.url must start with http:// or https://: {}",
                self.backend.url
            ))
            .into());
        }

        if let Err(e) = url::Url::parse(&self.backend.url) {
            return Err(MarketaError::Config(format!(
                "backend.url is not a valid URL ({}): {}",
                e, self.backend.url
            ))
            .into());
        }

        if let Some(stream_url) = &self.assistant.stream_url {
            if let Err(e) = url::Url::parse(stream_url) {
                return Err(MarketaError::Config(format!(
                    "assistant.stream_url is not a valid URL ({}): {}",
                    e, stream_url
                ))
                .into());
            }
        }

        if self.backend.request_timeout_seconds == 0 {
            return Err(MarketaError::Config(
                "backend.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.poll_interval_ms == 0 {
            return Err(MarketaError::Config(
                "assistant.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.max_poll_attempts == 0 {
            return Err(MarketaError::Config(
                "assistant.max_poll_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.max_poll_attempts > 600 {
            return Err(MarketaError::Config(
                "assistant.max_poll_attempts must be less than or equal to 600".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
