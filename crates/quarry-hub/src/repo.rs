//! Repository identifier parsing.
//!
//! A repository id names a remote storage location as `owner/name`, where
//! the owner is a user or an organization. Both namespaces behave
//! identically; the hub decides what the caller may write to.

use crate::error::{HubError, HubResult};

/// A parsed `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parse a repository id string.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_hub::RepoId;
    ///
    /// let repo = RepoId::parse("acme/wav2vec2-base").unwrap();
    /// assert_eq!(repo.owner(), "acme");
    /// assert_eq!(repo.name(), "wav2vec2-base");
    ///
    /// // A bare name without an owner is rejected.
    /// assert!(RepoId::parse("wav2vec2-base").is_err());
    /// ```
    pub fn parse(input: &str) -> HubResult<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(HubError::InvalidRepoId {
                input: input.to_string(),
                reason: "empty repository id".to_string(),
            });
        }

        let mut parts = input.splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = match parts.next() {
            Some(name) => name,
            None => {
                return Err(HubError::InvalidRepoId {
                    input: input.to_string(),
                    reason: "expected 'owner/name'".to_string(),
                })
            }
        };

        if name.contains('/') {
            return Err(HubError::InvalidRepoId {
                input: input.to_string(),
                reason: "repository id may contain only one '/'".to_string(),
            });
        }

        validate_segment(input, "owner", owner)?;
        validate_segment(input, "name", name)?;

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Build a repo id from already-validated parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> HubResult<Self> {
        Self::parse(&format!("{}/{}", owner.into(), name.into()))
    }

    /// The owner (user or organization) segment.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name segment.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoId {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Validate one segment of a repository id.
fn validate_segment(input: &str, label: &str, segment: &str) -> HubResult<()> {
    if segment.is_empty() {
        return Err(HubError::InvalidRepoId {
            input: input.to_string(),
            reason: format!("{} cannot be empty", label),
        });
    }

    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(HubError::InvalidRepoId {
            input: input.to_string(),
            reason: format!(
                "{} may only contain alphanumerics, '-', '_' and '.'",
                label
            ),
        });
    }

    if segment.starts_with(['-', '.']) || segment.ends_with(['-', '.']) {
        return Err(HubError::InvalidRepoId {
            input: input.to_string(),
            reason: format!("{} cannot start or end with '-' or '.'", label),
        });
    }

    if segment.contains("..") {
        return Err(HubError::InvalidRepoId {
            input: input.to_string(),
            reason: format!("{} cannot contain '..'", label),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_repo() {
        let repo = RepoId::parse("alice/test-extractor").unwrap();
        assert_eq!(repo.owner(), "alice");
        assert_eq!(repo.name(), "test-extractor");
        assert_eq!(repo.to_string(), "alice/test-extractor");
    }

    #[test]
    fn test_parse_org_repo() {
        let repo = RepoId::parse("valid-org/test-extractor").unwrap();
        assert_eq!(repo.owner(), "valid-org");
    }

    #[test]
    fn test_parse_missing_owner() {
        let result = RepoId::parse("just-a-name");
        assert!(matches!(result, Err(HubError::InvalidRepoId { .. })));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            RepoId::parse(""),
            Err(HubError::InvalidRepoId { .. })
        ));
        assert!(matches!(
            RepoId::parse("/"),
            Err(HubError::InvalidRepoId { .. })
        ));
        assert!(matches!(
            RepoId::parse("owner/"),
            Err(HubError::InvalidRepoId { .. })
        ));
        assert!(matches!(
            RepoId::parse("/name"),
            Err(HubError::InvalidRepoId { .. })
        ));
    }

    #[test]
    fn test_parse_too_many_segments() {
        let result = RepoId::parse("a/b/c");
        assert!(matches!(result, Err(HubError::InvalidRepoId { .. })));
    }

    #[test]
    fn test_parse_invalid_characters() {
        let result = RepoId::parse("owner/na me");
        assert!(matches!(result, Err(HubError::InvalidRepoId { .. })));
    }

    #[test]
    fn test_parse_dot_traversal_rejected() {
        let result = RepoId::parse("owner/..");
        assert!(matches!(result, Err(HubError::InvalidRepoId { .. })));

        let result = RepoId::parse("owner/a..b");
        assert!(matches!(result, Err(HubError::InvalidRepoId { .. })));
    }

    #[test]
    fn test_parse_leading_trailing_separators() {
        assert!(RepoId::parse("owner/-name").is_err());
        assert!(RepoId::parse("owner/name-").is_err());
        assert!(RepoId::parse(".owner/name").is_err());
    }

    #[test]
    fn test_dots_and_underscores_allowed_inside() {
        let repo = RepoId::parse("acme_labs/wav2vec2.base_v1").unwrap();
        assert_eq!(repo.name(), "wav2vec2.base_v1");
    }

    #[test]
    fn test_from_str() {
        let repo: RepoId = "alice/test".parse().unwrap();
        assert_eq!(repo.owner(), "alice");
    }
}
