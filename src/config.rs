use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "OncoGuide";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Per-user data directory, `./OncoGuide` when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn database_path() -> PathBuf {
    app_data_dir().join("oncoguide.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "oncoguide_lib=info,oncoguide=info,tower=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddress { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Runtime settings read from `ONCOGUIDE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub fallback_url: Option<String>,
    pub fallback_model: Option<String>,
    pub fallback_api_key: Option<String>,
    pub provider_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            db_path: database_path(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            fallback_url: None,
            fallback_model: None,
            fallback_api_key: None,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
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

        let bind_addr = match get("ONCOGUIDE_BIND") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAddress {
                var: "ONCOGUIDE_BIND",
                value,
            })?,
            None => defaults.bind_addr,
        };

        let provider_timeout_secs = match get("ONCOGUIDE_PROVIDER_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "ONCOGUIDE_PROVIDER_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => defaults.provider_timeout_secs,
        };

        Ok(Self {
            bind_addr,
            db_path: get("ONCOGUIDE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            ollama_url: get("ONCOGUIDE_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: get("ONCOGUIDE_OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            fallback_url: get("ONCOGUIDE_FALLBACK_URL"),
            fallback_model: get("ONCOGUIDE_FALLBACK_MODEL"),
            fallback_api_key: get("ONCOGUIDE_FALLBACK_API_KEY"),
            provider_timeout_secs,
        })
    }
}
