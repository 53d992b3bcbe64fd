// Access-token persistence. Obtaining the token (the OAuth consent flow)
// happens outside this program; here we only keep it between runs.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;

/// Token to start a session with: the environment wins over the file.
pub fn current_token(config: &Config) -> Result<Option<String>> {
    if let Some(token) = &config.access_token {
        return Ok(Some(token.clone()));
    }
    load_token(&config.token_path)
}

/// Load a token from `path`; a missing or blank file means "logged out".
pub fn load_token(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;
    let token = data.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// Persist `token` to `path`, creating parent directories as needed.
pub fn persist_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, token.trim())
        .with_context(|| format!("Failed to write token file {}", path.display()))?;
    Ok(())
}

/// Forget the persisted token. Succeeds if there was none.
pub fn remove_token(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove token file {}", path.display()))?;
    }
    Ok(())
}
