//! Loading and saving configurations by source.
//!
//! A source is either a local directory containing an
//! `extractor_config.json`, or a `owner/name` repository id resolved
//! through the hub (with cache and offline fallback).

use std::path::Path;

use tracing::debug;

use quarry_hub::{ArtifactLoader, HubConfig, RepoId, CONFIG_FILE};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};

/// Load a configuration from a local directory or a hub repository.
///
/// Local directories win: if `source` names an existing directory the
/// configuration is read from disk and the hub is never contacted.
pub async fn load_config(source: &str, hub: &HubConfig) -> ExtractResult<ExtractorConfig> {
    let path = Path::new(source);
    if path.is_dir() {
        debug!(path = %path.display(), "loading configuration from local directory");
        let content = tokio::fs::read_to_string(path.join(CONFIG_FILE)).await?;
        return ExtractorConfig::from_json_str(&content);
    }

    let repo = RepoId::parse(source).map_err(|e| match e {
        quarry_hub::HubError::InvalidRepoId { input, reason } => ExtractError::InvalidConfig {
            message: format!("'{}' is not a local directory or a repository id: {}", input, reason),
        },
        other => other.into(),
    })?;

    let loader = ArtifactLoader::new(hub.clone())?;
    let artifact = loader.load(&repo).await?;
    debug!(repo = %repo, source = %artifact.source, "loaded configuration");

    ExtractorConfig::from_json_str(&artifact.content)
}

/// Write a configuration into a directory as `extractor_config.json`.
///
/// Creates the directory if it does not exist.
pub async fn save_config(dir: &Path, config: &ExtractorConfig) -> ExtractResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    let content = config.to_json_string()?;
    tokio::fs::write(dir.join(CONFIG_FILE), content).await?;
    debug!(path = %dir.display(), "saved configuration");
    Ok(())
}
