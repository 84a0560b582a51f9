use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OmnibusError, Result};

/// Top-level configuration for the Omnibus chatbot.
///
/// Loaded from `~/.omnibus/config.toml` by default. Secrets are usually
/// supplied through `SNOWFLAKE_*` environment variables instead of the file;
/// see [`OmnibusConfig::apply_env_overrides`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OmnibusConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl OmnibusConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OmnibusConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OmnibusError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay connection secrets from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay connection settings from an arbitrary key lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// wipe a value from the file.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let conn = &mut self.connection;
        if let Some(v) = get("SNOWFLAKE_ACCOUNT") {
            conn.account = v;
        }
        if let Some(v) = get("SNOWFLAKE_USER") {
            conn.user = v;
        }
        if let Some(v) = get("SNOWFLAKE_PASSWORD") {
            conn.password = v;
        }
        if let Some(v) = get("SNOWFLAKE_ROLE") {
            conn.role = Some(v);
        }
        if let Some(v) = get("SNOWFLAKE_WAREHOUSE") {
            conn.warehouse = Some(v);
        }
        if let Some(v) = get("SNOWFLAKE_DATABASE") {
            conn.database = Some(v);
        }
        if let Some(v) = get("SNOWFLAKE_SCHEMA") {
            conn.schema = Some(v);
        }
        if let Some(v) = get("SNOWFLAKE_HOST") {
            conn.host = Some(v);
        }
        if let Some(v) = get("SNOWFLAKE_TOKEN") {
            conn.token = v;
        }
        if let Some(v) = get("SNOWFLAKE_AUTHENTICATOR") {
            match v.parse::<Authenticator>() {
                Ok(auth) => conn.authenticator = auth,
                Err(e) => warn!("Ignoring SNOWFLAKE_AUTHENTICATOR: {}", e),
            }
        }
    }

    /// Check that everything needed to open a session is present.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        if self.search.service.trim().is_empty() {
            return Err(OmnibusError::Config(
                "search.service must not be empty".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(OmnibusError::Config(
                "llm.model must not be empty".to_string(),
            ));
        }
        if self.chat.max_question_chars == 0 {
            return Err(OmnibusError::Config(
                "chat.max_question_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the web session binds to.
    pub bind_addr: String,
    /// Port the web session listens on.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// How the session authenticates against the data platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authenticator {
    /// User name + password login that yields a session token.
    #[default]
    Password,
    /// Pre-issued programmatic access token sent as a bearer token.
    ProgrammaticAccessToken,
    /// Pre-issued OAuth access token sent as a bearer token.
    Oauth,
}

impl std::str::FromStr for Authenticator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" | "snowflake" => Ok(Authenticator::Password),
            "programmatic_access_token" | "pat" => Ok(Authenticator::ProgrammaticAccessToken),
            "oauth" => Ok(Authenticator::Oauth),
            other => Err(format!("unknown authenticator '{}'", other)),
        }
    }
}

/// Credentials and session context for the data platform.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Account identifier, e.g. `myorg-myaccount`.
    pub account: String,
    pub user: String,
    /// Read from file or environment, never written back by `save`.
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    /// Base URL override. Defaults to `https://{account}.snowflakecomputing.com`.
    pub host: Option<String>,
    pub authenticator: Authenticator,
    /// Bearer token for the token-based authenticators. Never written back
    /// by `save`.
    #[serde(skip_serializing)]
    pub token: String,
    /// Per-request timeout. Unset means the transport default (none).
    pub request_timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    /// Resolve the base URL all requests are issued against.
    pub fn base_url(&self) -> String {
        match self.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.trim_end_matches('/').to_string(),
            _ => format!("https://{}.snowflakecomputing.com", self.account.trim()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() && self.host.is_none() {
            return Err(OmnibusError::Config(
                "connection.account (or SNOWFLAKE_ACCOUNT) is required".to_string(),
            ));
        }
        match self.authenticator {
            Authenticator::Password => {
                if self.user.trim().is_empty() {
                    return Err(OmnibusError::Config(
                        "connection.user (or SNOWFLAKE_USER) is required".to_string(),
                    ));
                }
                if self.password.is_empty() {
                    return Err(OmnibusError::Config(
                        "connection.password (or SNOWFLAKE_PASSWORD) is required".to_string(),
                    ));
                }
            }
            Authenticator::ProgrammaticAccessToken | Authenticator::Oauth => {
                if self.token.trim().is_empty() {
                    return Err(OmnibusError::Config(
                        "connection.token (or SNOWFLAKE_TOKEN) is required".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

// Hand-written so secrets never reach the logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("host", &self.host)
            .field("authenticator", &self.authenticator)
            .field("token", &redact(&self.token))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Location of the semantic search service holding the rules corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub database: String,
    pub schema: String,
    pub service: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            database: "CORTEX_SEARCH_TUTORIAL_DB".to_string(),
            schema: "PUBLIC".to_string(),
            service: "OMNIBUS".to_string(),
        }
    }
}

/// Completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier used for both reformulation and answering.
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mistral-7b".to_string(),
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of prior turns offered as context to each question.
    pub history_turns: usize,
    /// Maximum accepted question length in characters.
    pub max_question_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            max_question_chars: 2000,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
