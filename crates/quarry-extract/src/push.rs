//! Publishing extractors to the hub.

use tracing::{debug, info};

use quarry_hub::{push_config, HubClient, HubConfig, RepoId};

use crate::auto;
use crate::config::ExtractorConfig;
use crate::error::ExtractResult;
use crate::extractor::FeatureExtractor;

/// Publish an extractor's configuration to a hub repository.
///
/// Ensures the repository exists, stamps the auto-class map if the
/// extractor's type is registered for auto-class loading, and uploads
/// the serialized configuration.
pub async fn push_extractor(
    extractor: &dyn FeatureExtractor,
    repo: &RepoId,
    hub: &HubConfig,
) -> ExtractResult<()> {
    let config = publishable_config(extractor);
    let content = config.to_json_string()?;

    let client = HubClient::new(hub.clone())?;
    push_config(&client, repo, &content).await?;

    info!(repo = %repo, extractor = extractor.type_name(), "pushed extractor");
    Ok(())
}

/// The configuration as it will be published, auto-class map included.
pub fn publishable_config(extractor: &dyn FeatureExtractor) -> ExtractorConfig {
    let mut config = extractor.to_config();

    if let Some(qualified) = auto::auto_class_for(extractor.type_name()) {
        debug!(
            extractor = extractor.type_name(),
            class = %qualified,
            "stamping auto-class map"
        );
        let mut map = config.auto_map().unwrap_or_default();
        map.insert(auto::AUTO_CLASS_KEY.to_string(), qualified);
        config.set_auto_map(&map);
    }

    config
}
