//! Feature-extractor configuration model with hub loading and publishing.
//!
//! An extractor serializes its state to an open JSON configuration
//! ([`ExtractorConfig`]). Configurations are loaded from local
//! directories or from hub repositories (through `quarry-hub`, with
//! caching and offline fallback) and published back with
//! [`SequenceFeatureExtractor::push_to_hub`] or [`push_extractor`].
//!
//! # Loading
//!
//! ```no_run
//! use quarry_extract::SequenceFeatureExtractor;
//! use quarry_hub::HubConfig;
//!
//! # async fn example() -> Result<(), quarry_extract::ExtractError> {
//! let hub = HubConfig::from_env();
//! let extractor = SequenceFeatureExtractor::from_pretrained("acme/wav2vec2-base", &hub).await?;
//! assert_eq!(extractor.sampling_rate, 16_000);
//! # Ok(())
//! # }
//! ```
//!
//! # Custom classes
//!
//! Configurations published from a custom extractor carry an `auto_map`
//! entry naming the class. Loading one through [`AutoFeatureExtractor`]
//! requires the caller to pass [`TrustRemoteCode::Allow`] and the class
//! to be registered via [`register_for_auto_class`].

pub mod auto;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pretrained;
pub mod push;
pub mod sequence;

pub use auto::{
    auto_class_for, register_for_auto_class, AutoFeatureExtractor, ExtractorCtor,
    TrustRemoteCode, AUTO_CLASS_KEY,
};
pub use config::{ExtractorConfig, AUTO_MAP_KEY, EXTRACTOR_TYPE_KEY};
pub use error::{ExtractError, ExtractResult};
pub use extractor::FeatureExtractor;
pub use pretrained::{load_config, save_config};
pub use push::{publishable_config, push_extractor};
pub use sequence::{SequenceFeatureExtractor, SEQUENCE_EXTRACTOR_TYPE};
