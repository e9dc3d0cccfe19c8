//! Runtime configuration, read once at startup.

use std::path::Path;

use crate::backends::google::DEFAULT_MODEL;
use crate::error::LLMError;
use crate::secret_store::{self, SecretStore};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV: &str = "MEDIGENIE_MODEL";
pub const BASE_URL_ENV: &str = "MEDIGENIE_BASE_URL";
pub const TIMEOUT_ENV: &str = "MEDIGENIE_TIMEOUT_SECS";
pub const ADDR_ENV: &str = "MEDIGENIE_ADDR";

pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Settings handed to [`crate::bridge::Bridge::from_config`] and the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Gemini API key. Its absence only shows up on the first request.
    pub api_key: Option<String>,
    pub model: String,
    /// Endpoint override; `None` means the public Gemini API
    pub base_url: Option<String>,
    /// Request timeout; `None` leaves the HTTP client default in place
    pub timeout_seconds: Option<u64>,
    /// Address the web form listens on
    pub addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout_seconds: None,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment, falling back to the secret store for
    /// the API key.
    pub fn from_env() -> Result<Self, LLMError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        if config.api_key.is_none() {
            config.api_key = SecretStore::new()
                .ok()
                .and_then(|store| store.get(secret_store::GOOGLE_API_KEY).cloned());
            if config.api_key.is_some() {
                log::debug!("using API key from the secret store");
            }
        }
        if config.api_key.is_none() {
            log::warn!("{} is not set; requests will fail until it is", API_KEY_ENV);
        }
        Ok(config)
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LLMError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout_seconds = match non_empty(TIMEOUT_ENV) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                LLMError::ConfigError(format!("{} must be a whole number of seconds: {}", TIMEOUT_ENV, e))
            })?),
            None => None,
        };

        Ok(Self {
            api_key: non_empty(API_KEY_ENV),
            model: non_empty(MODEL_ENV).unwrap_or(defaults.model),
            base_url: non_empty(BASE_URL_ENV),
            timeout_seconds,
            addr: non_empty(ADDR_ENV).unwrap_or(defaults.addr),
        })
    }
}

/// Loads `.env` from the working directory (or the nearest ancestor that has
/// one) into the process environment. Variables that are already set win.
/// Returns whether a file was loaded.
pub fn load_dotenv() -> bool {
    match dotenvy::dotenv() {
        Ok(path) => {
            log::debug!("loaded environment from {}", path.display());
            true
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            log::warn!("ignoring unreadable .env file: {}", e);
            false
        }
    }
}

/// Same as [`load_dotenv`] for an explicit file.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => {
            log::debug!("loaded environment from {}", path.display());
            true
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            log::warn!("ignoring unreadable {}: {}", path.display(), e);
            false
        }
    }
}
