//! Error types for the `vector-index` crate.

use thiserror::Error;

/// Errors that can occur while building or querying a vector index.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    /// A storage provider or settings value is missing, unknown, or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied input the index cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The resolved storage provider requires a capability the index does not implement.
    #[error(
        "The storage provider with alias '{alias}' requires an index that implements the '{required}' capability."
    )]
    CapabilityMismatch {
        /// The alias the storage provider was resolved from.
        alias: String,
        /// Name of the capability the provider requires.
        required: String,
    },

    /// A backend-specific operation was called on an index that does not provide it.
    #[error("{operation} is not implemented for this index")]
    NotImplemented {
        /// The operation that was called.
        operation: &'static str,
    },

    /// No backend is registered under the requested alias.
    #[error("No {kind} is configured for alias '{alias}'")]
    UnknownAlias {
        /// The kind of registry that was searched (e.g. "embedding backend").
        kind: &'static str,
        /// The alias that was requested.
        alias: String,
    },

    /// A matched document lacks a metadata field required for prompt assembly.
    #[error("Document with embedding_pk {embedding_pk} has no '{key}' metadata field")]
    MissingMetadata {
        /// The embedding primary key of the offending document.
        embedding_pk: i64,
        /// The metadata key that was expected.
        key: &'static str,
    },

    /// An embedding backend failed.
    #[error("Embedding error ({backend}): {message}")]
    Embedding {
        /// The embedding backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A storage provider failed.
    #[error("Storage error ({backend}): {message}")]
    Storage {
        /// The storage backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A chat backend failed.
    #[error("Chat error ({backend}): {message}")]
    Chat {
        /// The chat backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A document could not be converted to or from a domain object.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A settings file could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] toml::de::Error),

    /// A settings file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience result type for vector index operations.
pub type Result<T> = std::result::Result<T, VectorIndexError>;
