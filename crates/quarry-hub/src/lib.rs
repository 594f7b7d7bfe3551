//! Hub client for remote feature-extractor artifact distribution.
//!
//! This crate implements the client side of the hub protocol, providing:
//!
//! - HTTP client for the hub API with token auth and retry
//! - Local caching with integrity verification
//! - Artifact loading with offline fallback (cache substitution when the
//!   hub is unreachable)
//! - Publishing (repository creation, configuration upload)
//! - Best-effort scoped repository cleanup
//!
//! # Quick Start
//!
//! ```no_run
//! use quarry_hub::{ArtifactLoader, HubConfig, RepoId};
//!
//! # async fn example() -> Result<(), quarry_hub::HubError> {
//! let loader = ArtifactLoader::new(HubConfig::from_env())?;
//!
//! let repo = RepoId::parse("acme/wav2vec2-base")?;
//! let artifact = loader.load(&repo).await?;
//! println!("loaded from {}: {}", artifact.source, artifact.digest);
//! # Ok(())
//! # }
//! ```
//!
//! # Authentication
//!
//! Bearer tokens come from an explicit [`HubConfig`] token, the
//! `QUARRY_HUB_TOKEN` environment variable, or the persisted token store
//! (see [`auth::save_token`]).
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `QUARRY_HUB_URL` | Hub base URL (default: `https://hub.quarry-ml.dev/v1`) |
//! | `QUARRY_HUB_TOKEN` | Authentication token |
//! | `QUARRY_HUB_OFFLINE` | Serve from cache only, never touch the network |
//! | `QUARRY_CACHE_DIR` | Cache directory override |
//! | `QUARRY_HUB_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `QUARRY_HUB_MAX_RETRIES` | Max retries for transient failures (default: 3) |

pub mod auth;
pub mod cache;
pub mod client;
mod digest;
pub mod error;
pub mod loader;
pub mod publish;
pub mod repo;
pub mod types;

// Re-export main types
pub use auth::TokenProvider;
pub use cache::{ArtifactCache, CacheEntry, CacheMeta, CONFIG_FILE};
pub use client::{HubClient, HUB_USER_AGENT};
pub use error::{HubError, HubResult};
pub use loader::{ArtifactLoader, LoadSource, LoadedArtifact};
pub use publish::{push_config, RepoGuard};
pub use repo::RepoId;
pub use types::{ArtifactHeaders, ArtifactMeta, FetchResult, HubConfig, RepoInfo};

pub use digest::compute_digest;
