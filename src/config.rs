//! Configuration management for QueryDesk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{QuerydeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for QueryDesk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Where the session token is persisted
    #[serde(default)]
    pub session: SessionConfig,
    /// Interactive shell settings
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend; `/api` is appended for every endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Body encoding used for `POST /login`
    #[serde(default)]
    pub login_encoding: LoginEncoding,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            login_encoding: LoginEncoding::default(),
        }
    }
}

/// Login body encoding
///
/// The backend accepts the OAuth2 password form either url-encoded or as a
/// multipart form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginEncoding {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `multipart/form-data`
    Multipart,
}

impl std::str::FromStr for LoginEncoding {
    type Err = QuerydeskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "form" => Ok(Self::Form),
            "multipart" => Ok(Self::Multipart),
            other => Err(QuerydeskError::Config(format!(
                "Invalid login encoding: {}. Must be one of: form, multipart",
                other
            ))),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage backend for the bearer token
    #[serde(default)]
    pub storage: StorageBackend,

    /// Explicit session file path (file backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Token storage backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file in the user's data directory
    #[default]
    File,
    /// OS credential store
    Keyring,
    /// Process memory only; nothing survives exit
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = QuerydeskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(QuerydeskError::Config(format!(
                "Invalid session storage: {}. Must be one of: file, keyring, memory",
                other
            ))),
        }
    }
}

/// Interactive shell configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Optional readline history file
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QuerydeskError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| QuerydeskError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("QUERYDESK_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: QUERYDESK_BASE_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("QUERYDESK_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid QUERYDESK_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(encoding) = std::env::var("QUERYDESK_LOGIN_ENCODING") {
            match encoding.parse() {
                Ok(value) => self.api.login_encoding = value,
                Err(e) => tracing::warn!("{}, keeping {:?}", e, self.api.login_encoding),
            }
        }

        if let Ok(storage) = std::env::var("QUERYDESK_SESSION_STORAGE") {
            match storage.parse() {
                Ok(value) => self.session.storage = value,
                Err(e) => tracing::warn!("{}, keeping {:?}", e, self.session.storage),
            }
        }

        if let Ok(path) = std::env::var("QUERYDESK_SESSION_PATH") {
            tracing::debug!(path = %path, "Env override: QUERYDESK_SESSION_PATH");
            self.session.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if cli.ephemeral {
            self.session.storage = StorageBackend::Memory;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an absolute http(s) URL or the
    /// timeout is outside `1..=600` seconds.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            QuerydeskError::Config(format!("Invalid base_url {}: {}", self.api.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(QuerydeskError::Config(format!(
                "base_url must use http or https, got: {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(
                QuerydeskError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.api.timeout_seconds > 600 {
            return Err(QuerydeskError::Config(
                "timeout_seconds must be less than or equal to 600".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
