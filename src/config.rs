// Runtime configuration. Every setting comes from an environment variable
// with a fallback default, so the binary runs with no setup beyond a token.

use std::path::PathBuf;

pub const API_URL_VAR: &str = "GDRIVE_API_URL";
pub const TOKEN_PATH_VAR: &str = "GDRIVE_TOKEN_PATH";
pub const HISTORY_PATH_VAR: &str = "GDRIVE_HISTORY_PATH";
pub const ACCESS_TOKEN_VAR: &str = "GDRIVE_ACCESS_TOKEN";
pub const LOG_VAR: &str = "GDRIVE_LOG";

const DEFAULT_API_URL: &str = "https://www.googleapis.com";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL for metadata, download and upload calls.
    pub api_url: String,
    /// File the access token is persisted to between runs.
    pub token_path: PathBuf,
    /// Prompt history file.
    pub history_path: PathBuf,
    /// Token supplied through the environment; skips the login screen.
    pub access_token: Option<String>,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            api_url: get(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.into()),
            token_path: get(TOKEN_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".gdrive_cli_token")),
            history_path: get(HISTORY_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".gdrive_cli_history")),
            access_token: get(ACCESS_TOKEN_VAR),
            log_filter: get(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
