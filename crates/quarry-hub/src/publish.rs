//! Publishing artifacts to the hub.
//!
//! Publishing ensures the target repository exists, then uploads the
//! serialized configuration. Rejections from the hub (auth, policy)
//! surface to the caller unmodified; nothing local is touched on failure.

use tracing::{debug, info, warn};

use crate::client::HubClient;
use crate::error::HubResult;
use crate::repo::RepoId;

/// Publish serialized configuration content to a repository.
pub async fn push_config(client: &HubClient, repo: &RepoId, content: &str) -> HubResult<()> {
    client.ensure_repo(repo).await?;
    client.upload_config(repo, content).await?;
    info!(repo = %repo, "published configuration");
    Ok(())
}

/// Scoped best-effort repository cleanup.
///
/// Deletes the repository when the guard goes out of scope (or when
/// [`RepoGuard::cleanup`] is called explicitly). Deletion failures are
/// logged and swallowed; teardown never masks the caller's own outcome.
#[derive(Debug)]
pub struct RepoGuard {
    client: HubClient,
    repo: RepoId,
    armed: bool,
}

impl RepoGuard {
    /// Guard a repository for deletion at scope exit.
    pub fn new(client: HubClient, repo: RepoId) -> Self {
        Self {
            client,
            repo,
            armed: true,
        }
    }

    /// Keep the repository; the guard will not delete it.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Delete the guarded repository now, swallowing any error.
    pub async fn cleanup(mut self) {
        self.armed = false;
        delete_best_effort(&self.client, &self.repo).await;
    }
}

impl Drop for RepoGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        // Best effort from a destructor: spawn the deletion if a runtime
        // is available, otherwise just log that the repo was left behind.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.client.clone();
                let repo = self.repo.clone();
                handle.spawn(async move {
                    delete_best_effort(&client, &repo).await;
                });
            }
            Err(_) => {
                warn!(repo = %self.repo, "no runtime at guard drop, repository not deleted");
            }
        }
    }
}

async fn delete_best_effort(client: &HubClient, repo: &RepoId) {
    match client.delete_repo(repo).await {
        Ok(()) => debug!(repo = %repo, "deleted repository"),
        Err(e) => debug!(repo = %repo, error = %e, "repository cleanup failed (ignored)"),
    }
}
