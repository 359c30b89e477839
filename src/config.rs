//! Configuration types.
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file by the binary). Values that are present but unusable are reported as
//! [`ConfigError`]; missing optional sections simply disable the feature.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_AGENT_TYPE: &str = "code";
pub const DEFAULT_CONTACT: &str = "@your_bot_username";
pub const DEFAULT_MODEL: &str = "openchat/openchat-7b";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keywords an order must contain (case-insensitively) to get a reply.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "бот", "скрипт", "сайт", "парсинг", "scraper", "api", "telegram", "chrome", "python",
];

/// Settings for the chat-completion provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Bearer credential. `None` makes every generation fall back.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Where processed orders are persisted beyond the process lifetime.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Hosted libSQL database (`libsql://…` or `https://…`).
    Remote { url: String, auth_token: SecretString },
    /// Local SQLite file.
    Local { path: PathBuf },
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Label returned in `agent` fields.
    pub agent_type: String,
    /// Contact handle embedded in the fallback reply.
    pub contact: String,
    /// Relevance keywords, as configured (the filter lowercases them).
    pub keywords: Vec<String>,
    pub bind_addr: SocketAddr,
    pub llm: LlmConfig,
    /// Durable store; `None` runs with in-memory deduplication only.
    pub store: Option<StoreConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_type: DEFAULT_AGENT_TYPE.to_string(),
            contact: DEFAULT_CONTACT.to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            llm: LlmConfig::default(),
            store: None,
        }
    }
}

impl AgentConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let bind_addr = match get("CODE_AGENT_BIND") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "CODE_AGENT_BIND".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => defaults.bind_addr,
        };

        let timeout = match get("OPENROUTER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    key: "OPENROUTER_TIMEOUT_SECS".into(),
                    message: format!("{raw:?}: {e}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "OPENROUTER_TIMEOUT_SECS".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.llm.timeout,
        };

        let llm = LlmConfig {
            api_key: get("OPENROUTER_API_KEY").map(SecretString::from),
            model: get("OPENROUTER_MODEL").unwrap_or(defaults.llm.model),
            endpoint: get("OPENROUTER_URL").unwrap_or(defaults.llm.endpoint),
            timeout,
        };

        let keywords = match get("CODE_AGENT_KEYWORDS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.keywords,
        };

        Ok(Self {
            agent_type: get("CODE_AGENT_TYPE").unwrap_or(defaults.agent_type),
            contact: get("CODE_AGENT_CONTACT").unwrap_or(defaults.contact),
            keywords,
            bind_addr,
            llm,
            store: store_from_lookup(&get),
        })
    }
}

/// Directory for daily-rotated log files, read before logging is set up.
pub fn log_dir_from_env() -> Option<PathBuf> {
    std::env::var("CODE_AGENT_LOG_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Remote settings win over a local path. A URL without a token is ignored.
fn store_from_lookup<F>(get: &F) -> Option<StoreConfig>
where
    F: Fn(&str) -> Option<String>,
{
    match (get("ORDER_DB_URL"), get("ORDER_DB_TOKEN")) {
        (Some(url), Some(token)) => {
            return Some(StoreConfig::Remote {
                url,
                auth_token: SecretString::from(token),
            });
        }
        (Some(_), None) => {
            warn!("ORDER_DB_URL is set without ORDER_DB_TOKEN; remote order store disabled");
        }
        _ => {}
    }

    get("ORDER_DB_PATH").map(|path| StoreConfig::Local {
        path: PathBuf::from(path),
    })
}
