//! Artifact loading with offline fallback.
//!
//! Load order:
//! 1. Fresh cache (within TTL)
//! 2. Hub fetch (with etag revalidation; 304 serves the cached copy)
//! 3. On transport failure, stale cache fallback (the error is not surfaced)
//! 4. `ResourceUnavailable` when the hub is unreachable and nothing is cached
//!
//! A successful hub fetch refreshes the cache before returning. Corrupt
//! cache entries are evicted and re-fetched.

use tracing::{debug, info, warn};

use crate::cache::{ArtifactCache, CacheEntry};
use crate::client::HubClient;
use crate::error::{HubError, HubResult};
use crate::repo::RepoId;
use crate::types::HubConfig;

/// Loaded artifact content.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    /// Serialized configuration content.
    pub content: String,

    /// Where the artifact was loaded from.
    pub source: LoadSource,

    /// Content digest.
    pub digest: String,
}

/// Source of a loaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Served from a fresh (or 304-revalidated) cache entry.
    Cache,

    /// Fetched from the hub.
    Hub(String),

    /// Served from the cache because the hub was unreachable.
    OfflineFallback,
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Hub(url) => write!(f, "hub:{}", url),
            Self::OfflineFallback => write!(f, "offline-fallback"),
        }
    }
}

/// Artifact loader composing the hub client and the local cache.
pub struct ArtifactLoader {
    client: HubClient,
    cache: ArtifactCache,
    offline: bool,
}

impl ArtifactLoader {
    /// Create a loader from a hub configuration.
    pub fn new(config: HubConfig) -> HubResult<Self> {
        let cache = match &config.cache_dir {
            Some(dir) => ArtifactCache::with_dir(dir),
            None => ArtifactCache::new()?,
        };
        let offline = config.offline;
        let client = HubClient::new(config)?;

        Ok(Self {
            client,
            cache,
            offline,
        })
    }

    /// Create a loader from already-built components (used by tests).
    pub fn with_components(client: HubClient, cache: ArtifactCache, offline: bool) -> Self {
        Self {
            client,
            cache,
            offline,
        }
    }

    /// Load an artifact's configuration.
    pub async fn load(&self, repo: &RepoId) -> HubResult<LoadedArtifact> {
        if self.offline {
            debug!(repo = %repo, "offline mode, serving from cache");
            return self.serve_stale(repo, LoadSource::Cache).await;
        }

        // 1. Fresh cache
        if let Some(entry) = self.try_fresh_cache(repo).await? {
            info!(repo = %repo, "using cached artifact");
            return Ok(loaded(entry, LoadSource::Cache));
        }

        // 2. Hub fetch with etag revalidation
        let etag = self.cache.get_etag(repo).await;
        match self.client.fetch_artifact(repo, etag.as_deref()).await {
            Ok(Some(fetch)) => {
                if let Err(e) = self
                    .cache
                    .put(repo, &fetch, Some(self.client.endpoint()))
                    .await
                {
                    warn!(repo = %repo, error = %e, "failed to cache artifact");
                }

                let digest = fetch.computed_digest.clone();
                info!(repo = %repo, digest = %digest, "fetched artifact from hub");

                Ok(LoadedArtifact {
                    content: fetch.content,
                    source: LoadSource::Hub(self.client.endpoint().to_string()),
                    digest,
                })
            }
            Ok(None) => {
                // 304 Not Modified - the cached copy is still current
                let entry = self.cache.get_stale(repo).await?.ok_or_else(|| {
                    HubError::Cache {
                        message: "304 response but no cached entry".to_string(),
                    }
                })?;
                debug!(repo = %repo, "hub confirmed cached copy is current");
                Ok(loaded(entry, LoadSource::Cache))
            }
            Err(e) if e.is_transport() => {
                warn!(repo = %repo, error = %e, "hub unreachable, falling back to cache");
                self.serve_stale(repo, LoadSource::OfflineFallback).await
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch and cache an artifact for later offline use.
    pub async fn prefetch(&self, repo: &RepoId) -> HubResult<()> {
        if let Some(fetch) = self.client.fetch_artifact(repo, None).await? {
            self.cache
                .put(repo, &fetch, Some(self.client.endpoint()))
                .await?;
            info!(repo = %repo, "prefetched artifact");
        }
        Ok(())
    }

    /// Get the cache.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Get the hub client.
    pub fn client(&self) -> &HubClient {
        &self.client
    }

    /// Serve from the cache ignoring expiry, or fail as unavailable.
    async fn serve_stale(&self, repo: &RepoId, source: LoadSource) -> HubResult<LoadedArtifact> {
        match self.cache.get_stale(repo).await {
            Ok(Some(entry)) => Ok(loaded(entry, source)),
            Ok(None) => Err(HubError::ResourceUnavailable {
                repo: repo.to_string(),
            }),
            Err(HubError::DigestMismatch { .. }) => {
                // Corrupt and no network to re-fetch from
                warn!(repo = %repo, "cache entry corrupt, evicting");
                self.cache.evict(repo).await?;
                Err(HubError::ResourceUnavailable {
                    repo: repo.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Try the fresh cache path, evicting corrupt entries.
    async fn try_fresh_cache(&self, repo: &RepoId) -> HubResult<Option<CacheEntry>> {
        match self.cache.get(repo).await {
            Ok(entry) => Ok(entry),
            Err(HubError::DigestMismatch { .. }) => {
                warn!(repo = %repo, "cache integrity check failed, evicting");
                self.cache.evict(repo).await?;
                Ok(None)
            }
            Err(e) => {
                warn!(repo = %repo, error = %e, "cache read error");
                Ok(None)
            }
        }
    }
}

fn loaded(entry: CacheEntry, source: LoadSource) -> LoadedArtifact {
    LoadedArtifact {
        content: entry.content,
        source,
        digest: entry.metadata.digest,
    }
}
