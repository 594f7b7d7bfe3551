//! Token authentication for the hub.
//!
//! Tokens come from three places, checked in order:
//! - explicit token in `HubConfig`
//! - `QUARRY_HUB_TOKEN` environment variable
//! - the persisted token store (`<config dir>/quarry/token`)
//!
//! Credentials always flow through the provider; nothing mutates
//! process-global state.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::error::{HubError, HubResult};

/// Token provider for hub authentication.
#[derive(Debug, Clone)]
pub enum TokenProvider {
    /// Static token (from config or env).
    Static(String),

    /// No authentication.
    None,
}

impl TokenProvider {
    /// Create a static token provider.
    pub fn static_token(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Create from the environment and the persisted token store.
    ///
    /// Checks in order:
    /// 1. `QUARRY_HUB_TOKEN` - static token
    /// 2. persisted token file written by [`save_token`]
    /// 3. Falls back to no auth
    pub fn from_env() -> Self {
        if let Ok(token) = std::env::var("QUARRY_HUB_TOKEN") {
            if !token.is_empty() {
                return Self::Static(token);
            }
        }

        if let Some(token) = read_stored_token() {
            return Self::Static(token);
        }

        Self::None
    }

    /// Get the current token.
    pub async fn get_token(&self) -> HubResult<Option<String>> {
        match self {
            Self::Static(token) => Ok(Some(token.clone())),
            Self::None => Ok(None),
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for TokenProvider {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Default path of the persisted token file.
pub fn token_path() -> HubResult<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| HubError::Config {
            message: "could not determine config directory".to_string(),
        })?;
    Ok(base.join("quarry").join("token"))
}

/// Persist a token to the local token store.
pub async fn save_token(token: &str) -> HubResult<()> {
    save_token_at(&token_path()?, token).await
}

/// Persist a token at an explicit path (used by tests).
pub async fn save_token_at(path: &std::path::Path, token: &str) -> HubResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| HubError::Config {
                message: format!("failed to create token directory: {}", e),
            })?;
    }

    fs::write(path, token.trim())
        .await
        .map_err(|e| HubError::Config {
            message: format!("failed to write token file: {}", e),
        })?;

    debug!(path = %path.display(), "saved hub token");
    Ok(())
}

/// Remove the persisted token, if any.
pub async fn delete_token() -> HubResult<()> {
    let path = token_path()?;
    if path.exists() {
        fs::remove_file(&path)
            .await
            .map_err(|e| HubError::Config {
                message: format!("failed to remove token file: {}", e),
            })?;
        debug!(path = %path.display(), "deleted hub token");
    }
    Ok(())
}

fn read_stored_token() -> Option<String> {
    let path = token_path().ok()?;
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
