//! Storage provider contract and index capability tags.
//!
//! A [`StorageProvider`] owns the connection settings for one vector storage
//! backend. Each provider declares the [`Capability`] an index must implement
//! to be used with it; [`VectorIndex`](crate::VectorIndex) checks this before
//! handing out the provider.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, VectorIndexError};

/// A named capability an index implements and a storage provider requires.
///
/// # Example
///
/// ```rust,ignore
/// use vector_index::Capability;
///
/// pub const PGVECTOR: Capability = Capability::new("pgvector");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability(&'static str);

impl Capability {
    /// Create a capability tag with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The capability name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A vector storage backend adapter with a typed configuration.
///
/// Implementors must name their configuration type and the capability they
/// require; leaving either out is a compile error. The configuration is built
/// from a raw settings mapping with [`from_raw_config`](StorageProvider::from_raw_config),
/// which is the single validation point: missing keys and unknown keys are
/// both rejected there.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct QdrantConfig { url: String, collection: String }
///
/// struct QdrantProvider { config: QdrantConfig }
///
/// impl StorageProvider for QdrantProvider {
///     type Config = QdrantConfig;
///     const CAPABILITY: Capability = Capability::new("qdrant");
///
///     fn new(config: QdrantConfig) -> Result<Self> { Ok(Self { config }) }
///     fn config(&self) -> &QdrantConfig { &self.config }
/// }
/// ```
pub trait StorageProvider: Send + Sync + Sized + 'static {
    /// Backend-specific configuration.
    type Config: DeserializeOwned + Send + Sync;

    /// The capability an index must implement to use this provider.
    const CAPABILITY: Capability;

    /// Construct the provider from an already validated configuration.
    fn new(config: Self::Config) -> Result<Self>;

    /// The provider's configuration.
    fn config(&self) -> &Self::Config;

    /// Construct the provider from a raw settings mapping.
    ///
    /// The mapping is copied before use, so the caller's map is never
    /// modified. Keys that `Self::Config` does not declare are rejected
    /// whether or not the type denies unknown fields itself.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Config`] if the mapping does not describe a
    /// valid `Self::Config`, or whatever [`new`](StorageProvider::new) returns.
    fn from_raw_config(raw: &Map<String, Value>) -> Result<Self> {
        let mut unknown = Vec::new();
        let config: Self::Config =
            serde_ignored::deserialize(Value::Object(raw.clone()), |path| {
                unknown.push(path.to_string())
            })
            .map_err(|e| {
                VectorIndexError::Config(format!(
                    "Missing configuration settings for the vector backend: {e}"
                ))
            })?;
        if let Some(key) = unknown.first() {
            return Err(VectorIndexError::Config(format!(
                "Unknown configuration setting for the vector backend: {key}"
            )));
        }
        Self::new(config)
    }
}

/// Type-erased view of a [`StorageProvider`], as stored in registries.
///
/// Implemented for every `StorageProvider`; use
/// [`downcast_provider`] to recover the concrete type.
pub trait AnyStorageProvider: Send + Sync {
    /// The capability an index must implement to use this provider.
    fn required_capability(&self) -> Capability;

    /// The concrete provider type name, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete provider.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<P: StorageProvider> AnyStorageProvider for P {
    fn required_capability(&self) -> Capability {
        P::CAPABILITY
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<P>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Recover the concrete provider type from a type-erased provider.
///
/// # Errors
///
/// Returns [`VectorIndexError::Config`] if `provider` is not a `P`.
pub fn downcast_provider<P: StorageProvider>(
    provider: Arc<dyn AnyStorageProvider>,
) -> Result<Arc<P>> {
    let found = provider.type_name();
    provider.into_any().downcast::<P>().map_err(|_| {
        VectorIndexError::Config(format!(
            "storage provider is a {found}, not a {}",
            std::any::type_name::<P>()
        ))
    })
}
