//! Configuration loading, validation, and management for Amino Chat.
//!
//! Loads configuration from `~/.aminochat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aminochat/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Answer store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Language-model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chat resolution policy and fixed texts
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Requests per minute per client address (0 = unlimited)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allowed CORS origins. Empty = any origin (the widget is embedded
    /// on other sites).
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Serve the embedded chat widget at `/`
    #[serde(default = "default_true")]
    pub serve_frontend: bool,
}

fn default_port() -> u16 {
    3005
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_rate_limit() -> u32 {
    60
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rate_limit_per_minute: default_rate_limit(),
            max_body_bytes: default_max_body_bytes(),
            allowed_origins: vec![],
            serve_frontend: true,
        }
    }
}

/// Which answer store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Mysql,
    Memory,
}

impl StoreBackend {
    /// Infer the backend from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::Mysql)
        } else if url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Full connection URL. Takes precedence over the discrete fields below.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}
fn default_max_connections() -> u32 {
    10
}
fn default_connect_timeout() -> u64 {
    10
}

impl DatabaseConfig {
    /// Default SQLite location when no URL is configured.
    pub fn default_sqlite_url() -> String {
        "sqlite://aminochat.db".into()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: Some(Self::default_sqlite_url()),
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &redact(&self.url))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Models tried in order when the primary model fails or times out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_models: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Upper bound on generated response size
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Per-call timeout at the adapter boundary
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Threshold for the harassment safety filter
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: String,
}

fn default_provider_name() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-pro".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_top_p() -> f32 {
    1.0
}
fn default_max_output_tokens() -> u32 {
    800
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_safety_threshold() -> String {
    "BLOCK_LOW_AND_ABOVE".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: None,
            api_url: None,
            model: default_model(),
            fallback_models: Vec::new(),
            temperature: default_temperature(),
            top_k: None,
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            safety_threshold: default_safety_threshold(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("fallback_models", &self.fallback_models)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("safety_threshold", &self.safety_threshold)
            .finish()
    }
}

/// Resolution policy: which categories go to the model, and the fixed texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Categories with an id at or above this go to the language model
    #[serde(default = "default_open_ended_threshold")]
    pub open_ended_threshold: u16,

    /// Returned for unrecognized input
    #[serde(default = "default_unrecognized_message")]
    pub unrecognized_message: String,

    /// Returned when the user is asked to rephrase
    #[serde(default = "default_clarification_message")]
    pub clarification_message: String,

    /// Returned instead of model output when the provider blocks a reply
    #[serde(default = "default_safety_notice")]
    pub safety_notice: String,
}

fn default_open_ended_threshold() -> u16 {
    6
}
fn default_unrecognized_message() -> String {
    concat!(
        "Terima kasih telah menggunakan layanan chat AI Otomatis Amino Hospital, ",
        "namun sayangnya kami tidak memiliki akses terkait tentang hal yang telah anda tanyakan. ",
        "Untuk informasi lebih lanjut, anda bisa mencarinya sendiri di sumber terkait",
    )
    .into()
}
fn default_clarification_message() -> String {
    "Maaf, apakah anda bisa mengulangi pertanyaan anda?".into()
}
fn default_safety_notice() -> String {
    "Your request cannot be processed due to safety restrictions.".into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            open_ended_threshold: default_open_ended_threshold(),
            unrecognized_message: default_unrecognized_message(),
            clarification_message: default_clarification_message(),
            safety_notice: default_safety_notice(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location when `None`,
    /// then apply environment variable overrides.
    ///
    /// Recognized variables:
    /// - `PORT`
    /// - `AMINOCHAT_API_KEY`, `GEMINI_API_KEY`, `API_KEY` (first set wins)
    /// - `AMINOCHAT_MODEL`
    /// - `AMINOCHAT_FALLBACK_MODELS` (comma-separated)
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` (select MySQL)
    /// - `DATABASE_URL` (backend inferred from the scheme)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_path();
        Self::load_with_env(path.unwrap_or(default_path.as_path()), |key| {
            std::env::var(key).ok()
        })
    }

    /// Read `path`, apply overrides from `env`, then validate the result.
    pub fn load_with_env<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)?;
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. The result is not
    /// validated: environment overrides may still fill in required fields.
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

        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    pub fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = env("PORT") {
            self.gateway.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("PORT is not a port: {port}")))?;
        }

        if let Some(key) = env("AMINOCHAT_API_KEY")
            .or_else(|| env("GEMINI_API_KEY"))
            .or_else(|| env("API_KEY"))
        {
            self.provider.api_key = Some(key);
        }

        if let Some(model) = env("AMINOCHAT_MODEL") {
            self.provider.model = model;
        }

        if let Some(models) = env("AMINOCHAT_FALLBACK_MODELS") {
            self.provider.fallback_models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(host) = env("DB_HOST") {
            let db = &mut self.database;
            db.backend = StoreBackend::Mysql;
            db.url = None;
            db.host = Some(host);
            if let Some(port) = env("DB_PORT") {
                db.port = Some(port.parse().map_err(|_| {
                    ConfigError::ValidationError(format!("DB_PORT is not a port: {port}"))
                })?);
            }
            db.user = env("DB_USER").or(db.user.take());
            db.password = env("DB_PASSWORD").or(db.password.take());
            db.name = env("DB_NAME").or(db.name.take());
        }

        if let Some(url) = env("DATABASE_URL") {
            let backend = StoreBackend::from_url(&url).ok_or_else(|| {
                ConfigError::ValidationError("DATABASE_URL must be a mysql:// or sqlite: URL".into())
            })?;
            self.database.backend = backend;
            self.database.url = Some(url);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aminochat")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.provider.top_p) {
            return Err(ConfigError::ValidationError(
                "provider.top_p must be between 0.0 and 1.0".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        if self.chat.open_ended_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "chat.open_ended_threshold must be >= 1".into(),
            ));
        }

        for (field, text) in [
            ("unrecognized_message", &self.chat.unrecognized_message),
            ("clarification_message", &self.chat.clarification_message),
            ("safety_notice", &self.chat.safety_notice),
        ] {
            if text.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "chat.{field} must not be empty"
                )));
            }
        }

        if self.database.backend == StoreBackend::Mysql
            && self.database.url.is_none()
            && self.database.host.is_none()
        {
            return Err(ConfigError::ValidationError(
                "mysql backend needs database.url or database.host".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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
