//! The extractor abstraction.

use crate::config::ExtractorConfig;

/// A feature extractor that can serialize itself to a configuration.
///
/// Implementations are identified by [`type_name`](Self::type_name),
/// which is stamped into the configuration's `extractor_type` field and
/// used for dispatch when loading.
pub trait FeatureExtractor: Send + Sync {
    /// The extractor's type name, e.g. `"SequenceFeatureExtractor"`.
    fn type_name(&self) -> &str;

    /// Serialize the extractor's state to a configuration.
    fn to_config(&self) -> ExtractorConfig;
}
