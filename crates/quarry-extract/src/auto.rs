//! Auto-class loading and the custom extractor registry.
//!
//! Built-in extractor types are dispatched by the `extractor_type`
//! field. Configurations published from a custom subclass additionally
//! carry an `auto_map` field naming the class to load; resolving such a
//! configuration requires (a) the caller opting in via
//! [`TrustRemoteCode::Allow`] and (b) the class having been registered
//! in this process with [`register_for_auto_class`].

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tracing::debug;

use quarry_hub::HubConfig;

use crate::config::{ExtractorConfig, EXTRACTOR_TYPE_KEY};
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::FeatureExtractor;
use crate::pretrained;
use crate::sequence::{SequenceFeatureExtractor, SEQUENCE_EXTRACTOR_TYPE};

/// The `auto_map` key under which extractor classes are published.
pub const AUTO_CLASS_KEY: &str = "AutoFeatureExtractor";

/// Constructor for a registered extractor class.
pub type ExtractorCtor = fn(&ExtractorConfig) -> ExtractResult<Box<dyn FeatureExtractor>>;

/// Whether configurations referencing custom classes may be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustRemoteCode {
    /// Refuse configurations that reference a custom class.
    #[default]
    Deny,

    /// Resolve custom classes through the registry.
    Allow,
}

#[derive(Default)]
struct AutoClassRegistry {
    /// Class name -> constructor.
    constructors: HashMap<String, ExtractorCtor>,

    /// Type name -> qualified class name published in `auto_map`.
    auto_classes: HashMap<String, String>,
}

fn registry() -> &'static RwLock<AutoClassRegistry> {
    static REGISTRY: OnceLock<RwLock<AutoClassRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(AutoClassRegistry::default()))
}

/// Register a custom extractor class for auto-class loading.
///
/// `qualified_name` is the name published in `auto_map` (by convention
/// `module.ClassName`); its final segment is the class name used for
/// constructor lookup when loading. Publishing an extractor whose type
/// name is registered here stamps the auto-class map into its
/// configuration.
pub fn register_for_auto_class(
    type_name: impl Into<String>,
    qualified_name: impl Into<String>,
    ctor: ExtractorCtor,
) {
    let type_name = type_name.into();
    let qualified_name = qualified_name.into();
    let class = class_name(&qualified_name).to_string();

    debug!(type_name = %type_name, class = %qualified_name, "registering auto class");

    let mut reg = registry().write().unwrap_or_else(|e| e.into_inner());
    reg.constructors.insert(class, ctor);
    reg.auto_classes.insert(type_name, qualified_name);
}

/// The qualified class name registered for a type name, if any.
pub fn auto_class_for(type_name: &str) -> Option<String> {
    let reg = registry().read().unwrap_or_else(|e| e.into_inner());
    reg.auto_classes.get(type_name).cloned()
}

fn constructor_for(class: &str) -> Option<ExtractorCtor> {
    let reg = registry().read().unwrap_or_else(|e| e.into_inner());
    reg.constructors.get(class).copied()
}

fn class_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Type-dispatched extractor loading.
pub struct AutoFeatureExtractor;

impl AutoFeatureExtractor {
    /// Load whichever extractor a source's configuration declares.
    ///
    /// Configurations carrying an `auto_map` entry are resolved through
    /// the registry, gated on `trust`. Everything else dispatches on
    /// `extractor_type` to the built-in extractors.
    pub async fn from_pretrained(
        source: &str,
        hub: &HubConfig,
        trust: TrustRemoteCode,
    ) -> ExtractResult<Box<dyn FeatureExtractor>> {
        let config = pretrained::load_config(source, hub).await?;
        Self::from_config(&config, trust)
    }

    /// Dispatch an already-loaded configuration.
    pub fn from_config(
        config: &ExtractorConfig,
        trust: TrustRemoteCode,
    ) -> ExtractResult<Box<dyn FeatureExtractor>> {
        if let Some(qualified) = config
            .auto_map()
            .and_then(|m| m.get(AUTO_CLASS_KEY).cloned())
        {
            if trust == TrustRemoteCode::Deny {
                return Err(ExtractError::UntrustedRemoteCode { class: qualified });
            }

            let class = class_name(&qualified);
            let ctor = constructor_for(class).ok_or_else(|| ExtractError::UnregisteredClass {
                class: class.to_string(),
            })?;
            debug!(class = %qualified, "loading custom extractor class");
            return ctor(config);
        }

        match config.extractor_type() {
            Some(SEQUENCE_EXTRACTOR_TYPE) => {
                Ok(Box::new(SequenceFeatureExtractor::from_config(config)?))
            }
            Some(other) => Err(ExtractError::UnknownExtractorType {
                extractor_type: other.to_string(),
            }),
            None => Err(ExtractError::MissingField {
                field: EXTRACTOR_TYPE_KEY.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn custom_ctor(config: &ExtractorConfig) -> ExtractResult<Box<dyn FeatureExtractor>> {
        let inner = SequenceFeatureExtractor::from_config(config)?;
        struct Custom(SequenceFeatureExtractor);
        impl FeatureExtractor for Custom {
            fn type_name(&self) -> &str {
                "TestRegisteredExtractor"
            }
            fn to_config(&self) -> ExtractorConfig {
                self.0.to_config()
            }
        }
        Ok(Box::new(Custom(inner)))
    }

    fn auto_mapped_config(qualified: &str) -> ExtractorConfig {
        let mut config = SequenceFeatureExtractor::default().to_config();
        let mut map = BTreeMap::new();
        map.insert(AUTO_CLASS_KEY.to_string(), qualified.to_string());
        config.set_auto_map(&map);
        config
    }

    #[test]
    fn test_builtin_dispatch() {
        let config = SequenceFeatureExtractor::default().to_config();
        let extractor =
            AutoFeatureExtractor::from_config(&config, TrustRemoteCode::default()).unwrap();
        assert_eq!(extractor.type_name(), SEQUENCE_EXTRACTOR_TYPE);
    }

    #[test]
    fn test_unknown_type() {
        let mut config = ExtractorConfig::new();
        config.set(EXTRACTOR_TYPE_KEY, json!("FrobnicatorExtractor"));

        assert!(matches!(
            AutoFeatureExtractor::from_config(&config, TrustRemoteCode::Deny),
            Err(ExtractError::UnknownExtractorType { .. })
        ));
    }

    #[test]
    fn test_missing_type() {
        let config = ExtractorConfig::new();
        assert!(matches!(
            AutoFeatureExtractor::from_config(&config, TrustRemoteCode::Deny),
            Err(ExtractError::MissingField { .. })
        ));
    }

    #[test]
    fn test_auto_map_requires_trust() {
        let config = auto_mapped_config("some_module.SomeClass");
        let result = AutoFeatureExtractor::from_config(&config, TrustRemoteCode::Deny);

        match result {
            Err(ExtractError::UntrustedRemoteCode { class }) => {
                assert_eq!(class, "some_module.SomeClass");
            }
            _ => panic!("expected UntrustedRemoteCode"),
        }
    }

    #[test]
    fn test_auto_map_unregistered_class() {
        let config = auto_mapped_config("some_module.NeverRegistered");
        assert!(matches!(
            AutoFeatureExtractor::from_config(&config, TrustRemoteCode::Allow),
            Err(ExtractError::UnregisteredClass { .. })
        ));
    }

    #[test]
    fn test_registered_class_loads() {
        register_for_auto_class(
            "TestRegisteredExtractor",
            "test_module.TestRegisteredExtractor",
            custom_ctor,
        );

        assert_eq!(
            auto_class_for("TestRegisteredExtractor").as_deref(),
            Some("test_module.TestRegisteredExtractor")
        );

        let config = auto_mapped_config("test_module.TestRegisteredExtractor");
        let extractor =
            AutoFeatureExtractor::from_config(&config, TrustRemoteCode::Allow).unwrap();
        assert_eq!(extractor.type_name(), "TestRegisteredExtractor");
    }
}
