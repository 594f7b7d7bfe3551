//! The built-in sequence feature extractor.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quarry_hub::{HubConfig, RepoId};

use crate::config::{ExtractorConfig, AUTO_MAP_KEY, EXTRACTOR_TYPE_KEY};
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::FeatureExtractor;
use crate::{pretrained, push};

/// Type name stamped into configurations produced by this extractor.
pub const SEQUENCE_EXTRACTOR_TYPE: &str = "SequenceFeatureExtractor";

/// Feature extractor for 1-d sequence inputs (audio and similar).
///
/// Unknown configuration fields survive a load/save round trip in
/// `extra`, so configurations written by newer versions (or subclasses)
/// are not silently stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFeatureExtractor {
    /// Dimension of each extracted feature vector.
    pub feature_size: u32,

    /// Expected input sampling rate in Hz.
    pub sampling_rate: u32,

    /// Value used to pad sequences to a common length.
    pub padding_value: f64,

    /// Whether to zero-mean unit-variance normalize the input.
    pub do_normalize: bool,

    /// Whether padded batches carry an attention mask.
    pub return_attention_mask: bool,

    /// Fields this version does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for SequenceFeatureExtractor {
    fn default() -> Self {
        Self {
            feature_size: 1,
            sampling_rate: 16_000,
            padding_value: 0.0,
            do_normalize: true,
            return_attention_mask: false,
            extra: BTreeMap::new(),
        }
    }
}

impl SequenceFeatureExtractor {
    /// Build an extractor from a configuration.
    ///
    /// Does not require `extractor_type` to be present; dispatch on the
    /// type name is the loader's job, not the constructor's.
    pub fn from_config(config: &ExtractorConfig) -> ExtractResult<Self> {
        let value = Value::Object(
            config
                .fields()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );

        let mut extractor: Self =
            serde_json::from_value(value).map_err(|e| ExtractError::InvalidConfig {
                message: format!("configuration does not describe a sequence extractor: {}", e),
            })?;

        // Bookkeeping fields are not extractor state.
        extractor.extra.remove(EXTRACTOR_TYPE_KEY);
        extractor.extra.remove(AUTO_MAP_KEY);

        Ok(extractor)
    }

    /// Load from a local directory or a hub repository.
    pub async fn from_pretrained(source: &str, hub: &HubConfig) -> ExtractResult<Self> {
        let config = pretrained::load_config(source, hub).await?;
        Self::from_config(&config)
    }

    /// Save the configuration into a directory.
    pub async fn save_pretrained(&self, dir: impl AsRef<Path>) -> ExtractResult<()> {
        pretrained::save_config(dir.as_ref(), &self.to_config()).await
    }

    /// Save into a directory and also publish to a hub repository.
    pub async fn save_pretrained_with_push(
        &self,
        dir: impl AsRef<Path>,
        repo: &RepoId,
        hub: &HubConfig,
    ) -> ExtractResult<()> {
        self.save_pretrained(dir).await?;
        self.push_to_hub(repo, hub).await
    }

    /// Publish the configuration to a hub repository, creating it if
    /// needed.
    pub async fn push_to_hub(&self, repo: &RepoId, hub: &HubConfig) -> ExtractResult<()> {
        push::push_extractor(self, repo, hub).await
    }
}

impl FeatureExtractor for SequenceFeatureExtractor {
    fn type_name(&self) -> &str {
        SEQUENCE_EXTRACTOR_TYPE
    }

    fn to_config(&self) -> ExtractorConfig {
        let mut config = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => {
                ExtractorConfig::from(map.into_iter().collect::<BTreeMap<_, _>>())
            }
            // A struct of plain fields always serializes to an object.
            _ => ExtractorConfig::new(),
        };
        config.set(EXTRACTOR_TYPE_KEY, Value::String(self.type_name().to_string()));
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let extractor = SequenceFeatureExtractor::default();
        assert_eq!(extractor.feature_size, 1);
        assert_eq!(extractor.sampling_rate, 16_000);
        assert_eq!(extractor.padding_value, 0.0);
        assert!(extractor.do_normalize);
        assert!(!extractor.return_attention_mask);
    }

    #[test]
    fn test_config_roundtrip_preserves_all_fields() {
        let mut extractor = SequenceFeatureExtractor {
            feature_size: 80,
            sampling_rate: 22_050,
            padding_value: -1.0,
            do_normalize: false,
            return_attention_mask: true,
            extra: BTreeMap::new(),
        };
        extractor
            .extra
            .insert("hop_length".to_string(), json!(160));

        let config = extractor.to_config();
        assert_eq!(config.extractor_type(), Some(SEQUENCE_EXTRACTOR_TYPE));
        assert_eq!(config.get("hop_length"), Some(&json!(160)));

        let restored = SequenceFeatureExtractor::from_config(&config).unwrap();
        assert_eq!(restored, extractor);
    }

    #[test]
    fn test_from_config_strips_bookkeeping_fields() {
        let mut config = SequenceFeatureExtractor::default().to_config();
        let mut map = BTreeMap::new();
        map.insert("AutoFeatureExtractor".to_string(), "m.C".to_string());
        config.set_auto_map(&map);

        let extractor = SequenceFeatureExtractor::from_config(&config).unwrap();
        assert!(!extractor.extra.contains_key(EXTRACTOR_TYPE_KEY));
        assert!(!extractor.extra.contains_key(AUTO_MAP_KEY));
    }

    #[test]
    fn test_from_config_rejects_wrong_shape() {
        let mut config = ExtractorConfig::new();
        config.set("feature_size", json!("not a number"));

        assert!(matches!(
            SequenceFeatureExtractor::from_config(&config),
            Err(ExtractError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_pretrained_local() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("extractor");

        let extractor = SequenceFeatureExtractor {
            sampling_rate: 8_000,
            ..Default::default()
        };
        extractor.save_pretrained(&dir).await.unwrap();

        let hub = HubConfig::default();
        let loaded =
            SequenceFeatureExtractor::from_pretrained(dir.to_str().unwrap(), &hub)
                .await
                .unwrap();
        assert_eq!(loaded, extractor);
    }
}
