// File manager configuration
// Read once at process start from the environment

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::dropbox::{API_BASE, CONTENT_BASE};
use crate::providers::DropboxEndpoints;

pub const ENV_ACCESS_TOKEN: &str = "DROPBOX_ACCESS_TOKEN";
pub const ENV_ACCESS_TOKEN_FALLBACK: &str = "DROPBOX_APP_ACCESS_KEY";
pub const ENV_API_BASE: &str = "DROPBOX_API_BASE";
pub const ENV_CONTENT_BASE: &str = "DROPBOX_CONTENT_BASE";
pub const ENV_TIMEOUT: &str = "DBX_FILES_TIMEOUT_SECS";
pub const ENV_MAX_UPLOADS: &str = "DBX_FILES_MAX_UPLOADS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing access token: set {0}")]
    MissingToken(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Tunables that are safe to log and persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub api_base: String,
    pub content_base: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on uploads of one batch running at once (None = unlimited)
    pub max_concurrent_uploads: Option<usize>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
            timeout_secs: 30,
            max_concurrent_uploads: None,
        }
    }
}

/// Full configuration including the access token
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub access_token: SecretString,
    pub timeout_secs: u64,
    pub max_concurrent_uploads: Option<usize>,
    api_base: String,
    content_base: String,
}

impl AppConfig {
    pub fn new(access_token: SecretString, settings: ClientSettings) -> Self {
        Self {
            access_token,
            timeout_secs: settings.timeout_secs,
            max_concurrent_uploads: settings.max_concurrent_uploads,
            api_base: settings.api_base,
            content_base: settings.content_base,
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup (the environment in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_ACCESS_TOKEN)
            .or_else(|| lookup(ENV_ACCESS_TOKEN_FALLBACK))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken(ENV_ACCESS_TOKEN))?;

        let mut settings = ClientSettings::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            settings.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(base) = lookup(ENV_CONTENT_BASE).filter(|v| !v.trim().is_empty()) {
            settings.content_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            settings.timeout_secs = parse_positive(ENV_TIMEOUT, &raw)? as u64;
        }
        if let Some(raw) = lookup(ENV_MAX_UPLOADS) {
            settings.max_concurrent_uploads = Some(parse_positive(ENV_MAX_UPLOADS, &raw)?);
        }

        Ok(Self::new(SecretString::from(token), settings))
    }

    pub fn endpoints(&self) -> DropboxEndpoints {
        DropboxEndpoints {
            api_base: self.api_base.clone(),
            content_base: self.content_base.clone(),
        }
    }

    /// Settings without the token
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            api_base: self.api_base.clone(),
            content_base: self.content_base.clone(),
            timeout_secs: self.timeout_secs,
            max_concurrent_uploads: self.max_concurrent_uploads,
        }
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue { key, value: raw.to_string() }),
    }
}
