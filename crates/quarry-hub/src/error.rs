//! Error types for the hub client.

use std::time::Duration;

/// Hub errors.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Repository or artifact not found on the hub.
    #[error("not found: {repo}")]
    NotFound { repo: String },

    /// Authentication failed or token invalid.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Repository already exists (create collision).
    #[error("repository already exists: {repo}")]
    AlreadyExists { repo: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Cached entry content does not match its recorded digest.
    #[error("digest mismatch for {repo}: expected {expected}, got {actual}")]
    DigestMismatch {
        repo: String,
        expected: String,
        actual: String,
    },

    /// Invalid repository identifier.
    #[error("invalid repository id: {input} - {reason}")]
    InvalidRepoId { input: String, reason: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Cache error.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Invalid response from the hub.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The hub is unreachable and no cached copy exists.
    #[error("resource unavailable: {repo} (hub unreachable and not cached)")]
    ResourceUnavailable { repo: String },
}

impl HubError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }

    /// Whether the error is a transport-level failure.
    ///
    /// Transport failures trigger the loader's cache fallback; everything
    /// else (auth, not-found, policy rejections) surfaces to the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;
