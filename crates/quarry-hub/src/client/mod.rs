//! Hub client for fetching and publishing artifacts.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::cache::CONFIG_FILE;
use crate::digest::compute_digest;
use crate::error::{HubError, HubResult};
use crate::repo::RepoId;
use crate::types::{ArtifactMeta, FetchResult, HubConfig, RepoInfo};

mod http;

use http::{FetchOutcome, HttpBackend, Payload};

/// User-agent header value sent with every request.
pub const HUB_USER_AGENT: &str = concat!("quarry-hub/", env!("CARGO_PKG_VERSION"));

/// Hub client.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: HttpBackend,
}

impl HubClient {
    pub fn new(config: HubConfig) -> HubResult<Self> {
        let token_provider = config
            .token
            .as_ref()
            .map(TokenProvider::static_token)
            .unwrap_or_else(TokenProvider::from_env);

        Self::with_token_provider(config, token_provider)
    }

    pub fn with_token_provider(
        config: HubConfig,
        token_provider: TokenProvider,
    ) -> HubResult<Self> {
        url::Url::parse(&config.url).map_err(|e| HubError::Config {
            message: format!("invalid hub URL '{}': {}", config.url, e),
        })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(HUB_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| HubError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config.url.trim_end_matches('/').to_string();

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                token_provider,
                config,
            },
        })
    }

    pub fn from_env() -> HubResult<Self> {
        Self::new(HubConfig::from_env())
    }

    /// Probe an artifact's metadata without downloading it.
    pub async fn check_artifact(&self, repo: &RepoId) -> HubResult<ArtifactMeta> {
        let url = self.config_url(repo);
        debug!(url = %url, "probing artifact metadata");

        let response = self
            .http
            .request(reqwest::Method::HEAD, &url, repo, None, None)
            .await?;
        let headers = crate::types::ArtifactHeaders::from_headers(response.headers());

        Ok(ArtifactMeta {
            repo: repo.to_string(),
            etag: headers.etag,
            size: headers.content_length,
        })
    }

    /// Fetch an artifact's configuration content.
    ///
    /// Returns `None` only when the hub answers 304 for the given etag.
    pub async fn fetch_artifact(
        &self,
        repo: &RepoId,
        etag: Option<&str>,
    ) -> HubResult<Option<FetchResult>> {
        let url = self.config_url(repo);
        debug!(url = %url, etag = ?etag, "fetching artifact content");

        match self.http.fetch_artifact(&url, repo, etag).await? {
            FetchOutcome::NotModified => Ok(None),
            FetchOutcome::Fetched(f) => {
                let computed_digest = compute_digest(&f.content);
                Ok(Some(FetchResult {
                    content: f.content,
                    headers: f.headers,
                    computed_digest,
                }))
            }
        }
    }

    /// Create a repository on the hub.
    pub async fn create_repo(&self, repo: &RepoId) -> HubResult<RepoInfo> {
        let url = format!("{}/repos/create", self.http.base_url);
        debug!(url = %url, repo = %repo, "creating repository");

        let payload = Payload::Json(serde_json::json!({
            "owner": repo.owner(),
            "name": repo.name(),
        }));

        let response = self
            .http
            .request(reqwest::Method::POST, &url, repo, None, Some(&payload))
            .await?;

        response
            .json()
            .await
            .map_err(|e| HubError::InvalidResponse {
                message: format!("failed to parse create response: {}", e),
            })
    }

    /// Ensure a repository exists, creating it if absent.
    ///
    /// A name collision on create means the repository is already there,
    /// which is exactly what the caller asked for.
    pub async fn ensure_repo(&self, repo: &RepoId) -> HubResult<()> {
        match self.create_repo(repo).await {
            Ok(_) => Ok(()),
            Err(HubError::AlreadyExists { .. }) => {
                debug!(repo = %repo, "repository already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a repository.
    pub async fn delete_repo(&self, repo: &RepoId) -> HubResult<()> {
        let url = format!("{}/repos/{}/{}", self.http.base_url, repo.owner(), repo.name());
        debug!(url = %url, "deleting repository");

        self.http
            .request(reqwest::Method::DELETE, &url, repo, None, None)
            .await?;
        Ok(())
    }

    /// Upload a serialized configuration to a repository.
    pub async fn upload_config(&self, repo: &RepoId, content: &str) -> HubResult<()> {
        let url = self.upload_url(repo);
        debug!(url = %url, bytes = content.len(), "uploading configuration");

        let payload = Payload::Text(content.to_string());
        self.http
            .request(reqwest::Method::PUT, &url, repo, None, Some(&payload))
            .await?;
        Ok(())
    }

    fn config_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/repos/{}/{}/resolve/{}",
            self.http.base_url,
            repo.owner(),
            repo.name(),
            CONFIG_FILE
        )
    }

    fn upload_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/repos/{}/{}/upload/{}",
            self.http.base_url,
            repo.owner(),
            repo.name(),
            CONFIG_FILE
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.token_provider.is_authenticated()
    }
}
