//! File and environment configuration.
//!
//! Configuration lives in a TOML file, by default at `<config dir>/paperlenz/config.toml`. Secrets
//! and endpoints may also come from the environment, which takes precedence over the file:
//!
//! - `GROQ_API_KEY`: language model API key
//! - `PAPERLENZ_ENDPOINT_URL`: base URL of a remote analysis service
//! - `PAPERLENZ_ANON_KEY`: bearer token sent to the remote analysis service
//!
//! # Examples
//!
//! ```
//! use paperlenz::config::Config;
//!
//! let config: Config = toml::from_str(
//!   r#"
//!     progress_interval_ms = 0
//!     sanitizer = "streaming"
//!
//!     [user]
//!     id = "4f7c2a1e-0000-0000-0000-000000000000"
//!     email = "ada@example.org"
//!   "#,
//! )
//! .unwrap();
//! assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
//! ```

use std::time::Duration;

use super::*;
use crate::{
  llm::{DEFAULT_HOST, DEFAULT_MODEL},
  sanitize::SanitizeStrategy,
};

/// Environment variable holding the language model API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Environment variable holding the remote analysis service URL.
pub const ENDPOINT_URL_VAR: &str = "PAPERLENZ_ENDPOINT_URL";
/// Environment variable holding the remote analysis service token.
pub const ANON_KEY_VAR: &str = "PAPERLENZ_ANON_KEY";

/// Default pause between progress updates, in milliseconds.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 1000;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// SQLite database file
  pub database_path:        PathBuf,
  /// Pause after each intermediate progress update
  pub progress_interval_ms: u64,
  /// How model replies are reduced to JSON
  pub sanitizer:            SanitizeStrategy,
  /// Language model provider
  pub llm:                  LlmConfig,
  /// Remote analysis service
  pub endpoint:             EndpointConfig,
  /// Signed-in identity
  pub user:                 UserConfig,
}

/// Language model provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  /// Base URL of the OpenAI-compatible API
  pub api_url: Url,
  /// Model name
  pub model:   String,
  /// API key, usually supplied through `GROQ_API_KEY` instead
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
}

/// Remote analysis service settings. Without a URL, analysis runs in-process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
  /// Base URL; the service path is appended to it
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:      Option<Url>,
  /// Bearer token
  #[serde(skip_serializing_if = "Option::is_none")]
  pub anon_key: Option<String>,
}

/// Identity supplied by the hosted auth provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
  /// User id
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:    Option<String>,
  /// Email address
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_path:        crate::database::Database::default_path(),
      progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
      sanitizer:            SanitizeStrategy::default(),
      llm:                  LlmConfig::default(),
      endpoint:             EndpointConfig::default(),
      user:                 UserConfig::default(),
    }
  }
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      api_url: Url::parse(DEFAULT_HOST).unwrap(),
      model:   DEFAULT_MODEL.to_string(),
      api_key: None,
    }
  }
}

impl Config {
  /// Returns the default path for the configuration file.
  ///
  /// - On Unix: `~/.config/paperlenz/config.toml`
  /// - On macOS: `~/Library/Application Support/paperlenz/config.toml`
  /// - On Windows: `%APPDATA%\paperlenz\config.toml`
  /// - Fallback: `./paperlenz/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("paperlenz").join("config.toml")
  }

  /// Reads the file at `path` and applies environment overrides.
  ///
  /// # Errors
  ///
  /// Fails if the file cannot be read or parsed, or an override is not a valid URL.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> { Self::load_file(path)?.with_environment() }

  /// Reads the file at `path` as is, without environment overrides.
  pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
  }

  /// Writes the configuration to `path`, creating parent directories.
  ///
  /// Secrets that came from the environment are written too; rewrite a file read with
  /// [`Config::load_file`] to avoid that.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    info!("Saved configuration to {}", path.display());
    Ok(())
  }

  /// Applies overrides from the process environment.
  pub fn with_environment(self) -> Result<Self> {
    self.with_overrides(|name| std::env::var(name).ok())
  }

  /// Applies overrides looked up by variable name. Empty values are ignored.
  pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(key) = lookup(API_KEY_VAR) {
      trace!("Using API key from {API_KEY_VAR}");
      self.llm.api_key = Some(key);
    }
    if let Some(url) = lookup(ENDPOINT_URL_VAR) {
      self.endpoint.url = Some(Url::parse(&url)?);
    }
    if let Some(key) = lookup(ANON_KEY_VAR) {
      self.endpoint.anon_key = Some(key);
    }
    Ok(self)
  }

  /// Pause after each intermediate progress update.
  pub fn progress_interval(&self) -> Duration { Duration::from_millis(self.progress_interval_ms) }
}
