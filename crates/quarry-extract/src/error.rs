//! Error types for extractor configuration and loading.

use thiserror::Error;

/// Errors from configuration handling, loading, and publishing.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Hub operation failed.
    #[error(transparent)]
    Hub {
        #[from]
        source: quarry_hub::HubError,
    },

    /// Configuration content is not valid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with it.
        message: String,
    },

    /// A required configuration field is absent.
    #[error("missing configuration field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The configuration names an extractor type this build does not know.
    #[error("unknown extractor type: {extractor_type}")]
    UnknownExtractorType {
        /// Declared type name.
        extractor_type: String,
    },

    /// The configuration references a custom class but loading custom
    /// classes was not allowed by the caller.
    #[error("configuration references custom class '{class}' but remote code is not trusted")]
    UntrustedRemoteCode {
        /// Qualified name of the referenced class.
        class: String,
    },

    /// The configuration references a custom class that has not been
    /// registered with the auto-class registry.
    #[error("custom class '{class}' is not registered")]
    UnregisteredClass {
        /// Class name looked up in the registry.
        class: String,
    },

    /// Local filesystem error while reading or writing a configuration.
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result alias for extractor operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
