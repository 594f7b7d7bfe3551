//! Local artifact cache.
//!
//! Stores the last successfully fetched configuration per repository, with
//! integrity verification on read.
//!
//! # Cache Structure
//!
//! ```text
//! <cache dir>/quarry/hub/{owner}/{name}/
//!   extractor_config.json   # Artifact content
//!   metadata.json           # Cache metadata
//! ```
//!
//! The TTL only gates the fresh-read path ([`ArtifactCache::get`]).
//! Entries are never auto-evicted: the offline fallback path
//! ([`ArtifactCache::get_stale`]) ignores expiry so the last successful
//! fetch stays servable while the hub is unreachable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::digest::compute_digest;
use crate::error::{HubError, HubResult};
use crate::repo::RepoId;
use crate::types::{ArtifactHeaders, FetchResult};

/// File name of the serialized configuration, locally and on the hub.
pub const CONFIG_FILE: &str = "extractor_config.json";

/// File name of the cache metadata sidecar.
const META_FILE: &str = "metadata.json";

/// Default cache TTL (24 hours).
const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

/// Cache metadata stored alongside artifact content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    /// When the artifact was fetched.
    pub fetched_at: DateTime<Utc>,

    /// Content digest (sha256:...).
    pub digest: String,

    /// ETag for conditional requests.
    #[serde(default)]
    pub etag: Option<String>,

    /// When the entry goes stale for the fresh-read path.
    pub expires_at: DateTime<Utc>,

    /// Hub URL this was fetched from.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Cached artifact entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Artifact content.
    pub content: String,

    /// Cache metadata.
    pub metadata: CacheMeta,
}

/// Artifact cache keyed by repository id.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    /// Base cache directory.
    cache_dir: PathBuf,
}

impl ArtifactCache {
    /// Create a new cache at the default location.
    ///
    /// Default: `<user cache dir>/quarry/hub`
    pub fn new() -> HubResult<Self> {
        Ok(Self {
            cache_dir: default_cache_dir()?,
        })
    }

    /// Create a cache with a custom directory.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Get the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn repo_dir(&self, repo: &RepoId) -> PathBuf {
        self.cache_dir.join(repo.owner()).join(repo.name())
    }

    /// Get a cached artifact, verifying integrity on read.
    ///
    /// Returns `None` if not cached or past its TTL.
    /// Returns `Err` on integrity failure (caller should evict and re-fetch).
    pub async fn get(&self, repo: &RepoId) -> HubResult<Option<CacheEntry>> {
        match self.read_entry(repo).await? {
            Some(entry) if entry.metadata.expires_at < Utc::now() => {
                debug!(
                    repo = %repo,
                    expires_at = %entry.metadata.expires_at,
                    "cache entry is stale"
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Get a cached artifact ignoring expiry.
    ///
    /// This is the offline fallback path: when the hub is unreachable the
    /// last successful fetch is served regardless of age. Integrity is
    /// still verified.
    pub async fn get_stale(&self, repo: &RepoId) -> HubResult<Option<CacheEntry>> {
        self.read_entry(repo).await
    }

    /// Store an artifact in the cache.
    pub async fn put(
        &self,
        repo: &RepoId,
        result: &FetchResult,
        endpoint: Option<&str>,
    ) -> HubResult<()> {
        let repo_dir = self.repo_dir(repo);

        fs::create_dir_all(&repo_dir)
            .await
            .map_err(|e| HubError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;

        let metadata = CacheMeta {
            fetched_at: Utc::now(),
            digest: result.computed_digest.clone(),
            etag: result.headers.etag.clone(),
            expires_at: cache_control_expiry(&result.headers, DEFAULT_TTL_SECS),
            endpoint: endpoint.map(String::from),
        };

        write_atomic(&repo_dir.join(CONFIG_FILE), &result.content).await?;

        let meta_json = serde_json::to_string_pretty(&metadata).map_err(|e| HubError::Cache {
            message: format!("failed to serialize metadata: {}", e),
        })?;
        write_atomic(&repo_dir.join(META_FILE), &meta_json).await?;

        debug!(repo = %repo, "cached artifact");
        Ok(())
    }

    /// Get cached metadata without loading content.
    pub async fn get_metadata(&self, repo: &RepoId) -> Option<CacheMeta> {
        let meta_path = self.repo_dir(repo).join(META_FILE);
        let content = fs::read_to_string(&meta_path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Get the ETag for conditional requests.
    pub async fn get_etag(&self, repo: &RepoId) -> Option<String> {
        self.get_metadata(repo).await.and_then(|m| m.etag)
    }

    /// Check if an artifact is cached (fresh or stale).
    pub async fn is_cached(&self, repo: &RepoId) -> bool {
        self.get_metadata(repo).await.is_some()
    }

    /// Evict an artifact from the cache.
    pub async fn evict(&self, repo: &RepoId) -> HubResult<()> {
        let repo_dir = self.repo_dir(repo);

        if repo_dir.exists() {
            fs::remove_dir_all(&repo_dir)
                .await
                .map_err(|e| HubError::Cache {
                    message: format!("failed to evict cache entry: {}", e),
                })?;
            debug!(repo = %repo, "evicted from cache");
        }

        Ok(())
    }

    /// Clear all cached artifacts.
    pub async fn clear(&self) -> HubResult<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)
                .await
                .map_err(|e| HubError::Cache {
                    message: format!("failed to clear cache: {}", e),
                })?;
            debug!("cleared artifact cache");
        }
        Ok(())
    }

    /// List all cached artifacts.
    pub async fn list(&self) -> HubResult<Vec<(RepoId, CacheMeta)>> {
        let mut result = Vec::new();

        if !self.cache_dir.exists() {
            return Ok(result);
        }

        let mut owners = read_dir(&self.cache_dir).await?;
        while let Some(owner_entry) = next_entry(&mut owners).await? {
            if !owner_entry.path().is_dir() {
                continue;
            }
            let owner = owner_entry.file_name().to_string_lossy().to_string();

            let mut names = read_dir(&owner_entry.path()).await?;
            while let Some(name_entry) = next_entry(&mut names).await? {
                if !name_entry.path().is_dir() {
                    continue;
                }
                let name = name_entry.file_name().to_string_lossy().to_string();

                let Ok(repo) = RepoId::new(&owner, &name) else {
                    continue;
                };
                if let Some(meta) = self.get_metadata(&repo).await {
                    result.push((repo, meta));
                }
            }
        }

        Ok(result)
    }

    /// Read and integrity-check an entry, ignoring expiry.
    async fn read_entry(&self, repo: &RepoId) -> HubResult<Option<CacheEntry>> {
        let repo_dir = self.repo_dir(repo);
        let config_path = repo_dir.join(CONFIG_FILE);
        let meta_path = repo_dir.join(META_FILE);

        if !config_path.exists() || !meta_path.exists() {
            debug!(repo = %repo, "artifact not in cache");
            return Ok(None);
        }

        let meta_content =
            fs::read_to_string(&meta_path)
                .await
                .map_err(|e| HubError::Cache {
                    message: format!("failed to read cache metadata: {}", e),
                })?;
        let metadata: CacheMeta =
            serde_json::from_str(&meta_content).map_err(|e| HubError::Cache {
                message: format!("failed to parse cache metadata: {}", e),
            })?;

        let content = fs::read_to_string(&config_path)
            .await
            .map_err(|e| HubError::Cache {
                message: format!("failed to read cached artifact: {}", e),
            })?;

        let computed_digest = compute_digest(&content);
        if computed_digest != metadata.digest {
            warn!(
                repo = %repo,
                expected = %metadata.digest,
                actual = %computed_digest,
                "cache integrity check failed"
            );
            return Err(HubError::DigestMismatch {
                repo: repo.to_string(),
                expected: metadata.digest,
                actual: computed_digest,
            });
        }

        debug!(repo = %repo, "cache hit");
        Ok(Some(CacheEntry { content, metadata }))
    }
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_dir("/tmp/quarry-cache/hub"))
    }
}

fn default_cache_dir() -> HubResult<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| HubError::Cache {
            message: "could not determine cache directory".to_string(),
        })?;

    Ok(base.join("quarry").join("hub"))
}

async fn write_atomic(path: &Path, content: &str) -> HubResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)
        .await
        .map_err(|e| HubError::Cache {
            message: format!("failed to write temp file: {}", e),
        })?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| HubError::Cache {
            message: format!("failed to rename temp file: {}", e),
        })?;

    Ok(())
}

fn cache_control_expiry(headers: &ArtifactHeaders, default_ttl_secs: i64) -> DateTime<Utc> {
    let ttl = headers
        .cache_control
        .as_ref()
        .and_then(|cc| {
            cc.split(',')
                .find(|part| part.trim().starts_with("max-age="))
                .and_then(|part| {
                    part.trim()
                        .strip_prefix("max-age=")
                        .and_then(|v| v.parse::<i64>().ok())
                })
        })
        .map(Duration::seconds)
        .unwrap_or_else(|| Duration::seconds(default_ttl_secs));

    Utc::now() + ttl
}

async fn read_dir(path: &Path) -> HubResult<fs::ReadDir> {
    fs::read_dir(path).await.map_err(|e| HubError::Cache {
        message: format!("failed to read cache directory: {}", e),
    })
}

async fn next_entry(dir: &mut fs::ReadDir) -> HubResult<Option<fs::DirEntry>> {
    dir.next_entry().await.map_err(|e| HubError::Cache {
        message: format!("failed to read directory entry: {}", e),
    })
}
