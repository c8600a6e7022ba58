//! Configuration loading, validation, and management for LeadChat.
//!
//! Loads configuration from `~/.leadchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use leadchat_core::persona::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, PersonaConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.leadchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the text-generation provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Text-generation provider endpoint
    #[serde(default)]
    pub provider: ProviderConfig,

    /// The fixed assistant persona and generation parameters
    #[serde(default)]
    pub persona: PersonaSettings,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Lead storage configuration
    #[serde(default)]
    pub leads: LeadsConfig,

    /// Thank-you email configuration
    #[serde(default)]
    pub email: EmailConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("persona", &self.persona)
            .field("gateway", &self.gateway)
            .field("leads", &self.leads)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default = "default_provider_url")]
    pub api_url: String,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_provider_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_provider_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSettings {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl PersonaSettings {
    pub fn to_persona(&self) -> PersonaConfig {
        PersonaConfig {
            system_prompt: self.system_prompt.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8888
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LeadsConfig {
    /// `sqlite:<path>`, `postgres://...`, or `memory`. Unset means a SQLite
    /// file inside the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl LeadsConfig {
    /// The effective database URL.
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            format!(
                "sqlite://{}",
                AppConfig::config_dir().join("leads.db").display()
            )
        })
    }
}

impl std::fmt::Debug for LeadsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Connection strings routinely embed passwords.
        f.debug_struct("LeadsConfig")
            .field("database_url", &redact(&self.database_url))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Resend API key. Thank-you emails are disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_from")]
    pub from: String,

    #[serde(default = "default_email_url")]
    pub api_url: String,
}

fn default_from() -> String {
    "noreply@yourdomain.com".into()
}
fn default_email_url() -> String {
    "https://api.resend.com".into()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: default_from(),
            api_url: default_email_url(),
        }
    }
}

impl EmailConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &redact(&self.api_key))
            .field("from", &self.from)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.leadchat/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `LEADCHAT_API_KEY`, then `OPENAI_API_KEY`
    /// - `LEADCHAT_MODEL`
    /// - `LEADCHAT_PORT`
    /// - `DATABASE_URL`
    /// - `RESEND_API_KEY`, `FROM_EMAIL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("LEADCHAT_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("LEADCHAT_MODEL") {
            self.persona.model = model;
        }
        if let Some(port) = non_empty("LEADCHAT_PORT").and_then(|p| p.parse().ok()) {
            self.gateway.port = port;
        }
        if let Some(url) = non_empty("DATABASE_URL") {
            self.leads.database_url = Some(url);
        }
        if let Some(key) = non_empty("RESEND_API_KEY") {
            self.email.api_key = Some(key);
        }
        if let Some(from) = non_empty("FROM_EMAIL") {
            self.email.from = from;
        }
    }

    /// Get the configuration directory path (`LEADCHAT_HOME` overrides it).
    pub fn config_dir() -> PathBuf {
        std::env::var("LEADCHAT_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_home().join(".leadchat"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.persona.temperature < 0.0 || self.persona.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "persona.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.persona.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "persona.max_tokens must be > 0".into(),
            ));
        }

        if self.persona.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona.model must not be empty".into(),
            ));
        }

        if self.persona.system_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona.system_prompt must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            persona: PersonaSettings::default(),
            gateway: GatewayConfig::default(),
            leads: LeadsConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
