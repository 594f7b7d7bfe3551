//! Configuration and response types for the hub protocol.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hub client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base URL for the hub API.
    #[serde(default = "default_hub_url")]
    pub url: String,

    /// Authentication token.
    #[serde(default)]
    pub token: Option<String>,

    /// Skip the network entirely and serve from cache.
    #[serde(default)]
    pub offline: bool,

    /// Custom cache directory (defaults to the user cache dir).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_hub_url() -> String {
    "https://hub.quarry-ml.dev/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            token: None,
            offline: false,
            cache_dir: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl HubConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `QUARRY_HUB_URL` | Hub base URL |
    /// | `QUARRY_HUB_TOKEN` | Authentication token |
    /// | `QUARRY_HUB_OFFLINE` | Skip the network, serve cache only |
    /// | `QUARRY_CACHE_DIR` | Cache directory override |
    /// | `QUARRY_HUB_TIMEOUT` | Request timeout in seconds (default: 30) |
    /// | `QUARRY_HUB_MAX_RETRIES` | Max retries for transient failures (default: 3) |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("QUARRY_HUB_URL").unwrap_or_else(|_| default_hub_url()),
            token: std::env::var("QUARRY_HUB_TOKEN").ok().filter(|t| !t.is_empty()),
            offline: std::env::var("QUARRY_HUB_OFFLINE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cache_dir: std::env::var("QUARRY_CACHE_DIR").ok().map(PathBuf::from),
            timeout_secs: std::env::var("QUARRY_HUB_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("QUARRY_HUB_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Enable or disable offline mode.
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// Headers returned with artifact content.
#[derive(Debug, Clone, Default)]
pub struct ArtifactHeaders {
    /// ETag for conditional requests.
    pub etag: Option<String>,

    /// Cache-Control header.
    pub cache_control: Option<String>,

    /// Content-Length.
    pub content_length: Option<u64>,
}

impl ArtifactHeaders {
    /// Parse headers from a response.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        Self {
            etag: headers
                .get(reqwest::header::ETAG)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            cache_control: headers
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            content_length: headers
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        }
    }
}

/// Result of fetching an artifact's configuration.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Serialized configuration content.
    pub content: String,

    /// Headers from the response.
    pub headers: ArtifactHeaders,

    /// Computed digest of the content.
    pub computed_digest: String,
}

/// Metadata from a HEAD probe of an artifact.
#[derive(Debug, Clone)]
pub struct ArtifactMeta {
    /// Repository id the artifact lives in.
    pub repo: String,

    /// ETag of the current content.
    pub etag: Option<String>,

    /// Size in bytes.
    pub size: Option<u64>,
}

/// Response from repository creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Owner segment.
    pub owner: String,

    /// Name segment.
    pub name: String,

    /// Web URL of the repository (if the hub reports one).
    #[serde(default)]
    pub url: Option<String>,
}
