//! Alias-keyed registries for embedding backends, chat backends and storage
//! providers.
//!
//! A [`Backends`] value bundles the three registries together with the query
//! prompt. It is built once through [`BackendsBuilder`], never mutated
//! afterwards, and can be installed as the process-wide instance that
//! [`VectorIndex`](crate::VectorIndex) implementations resolve against by
//! default.
//!
//! # Example
//!
//! ```rust,ignore
//! use vector_index::{Backends, Settings};
//!
//! let backends = Backends::builder()
//!     .embedding_backend("default", Arc::new(my_embedder))
//!     .chat_backend("default", Arc::new(my_chat))
//!     .storage_provider_kind::<PgVectorProvider>("pgvector")
//!     .settings(Settings::load("vector_index.toml")?)
//!     .build()?;
//! backends.install()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::chat::ChatBackend;
use crate::config::Settings;
use crate::embedding::EmbeddingBackend;
use crate::error::{Result, VectorIndexError};
use crate::storage::{AnyStorageProvider, StorageProvider};

/// The alias used when an index or caller does not name one.
pub const DEFAULT_ALIAS: &str = "default";

/// The built-in system prompt for [`VectorIndex::query`](crate::VectorIndex::query).
pub const DEFAULT_QUERY_PROMPT: &str = "You are a helpful assistant. Use the following context to answer the question. Don't mention the context in your answer.";

static GLOBAL_BACKENDS: OnceLock<Arc<Backends>> = OnceLock::new();

/// An alias → instance lookup table.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry. `kind` names the entries in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self { kind, entries: HashMap::new() }
    }

    /// Register `value` under `alias`, replacing any previous entry.
    pub fn register(&mut self, alias: impl Into<String>, value: Arc<T>) {
        self.entries.insert(alias.into(), value);
    }

    /// Look up the entry for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::UnknownAlias`] if nothing is registered.
    pub fn get(&self, alias: &str) -> Result<Arc<T>> {
        self.entries.get(alias).cloned().ok_or_else(|| VectorIndexError::UnknownAlias {
            kind: self.kind,
            alias: alias.to_string(),
        })
    }

    /// Whether an entry is registered under `alias`.
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Registered aliases, in no particular order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aliases: Vec<&str> = self.aliases().collect();
        aliases.sort_unstable();
        f.debug_struct("Registry").field("kind", &self.kind).field("aliases", &aliases).finish()
    }
}

/// Every backend a vector index can resolve by alias.
#[derive(Debug)]
pub struct Backends {
    embedding: Registry<dyn EmbeddingBackend>,
    chat: Registry<dyn ChatBackend>,
    storage: Registry<dyn AnyStorageProvider>,
    query_prompt: Option<String>,
}

impl Backends {
    /// Create a new [`BackendsBuilder`].
    pub fn builder() -> BackendsBuilder {
        BackendsBuilder::default()
    }

    /// Resolve an embedding backend.
    pub fn embedding_backend(&self, alias: &str) -> Result<Arc<dyn EmbeddingBackend>> {
        self.embedding.get(alias)
    }

    /// Resolve a chat backend.
    pub fn chat_backend(&self, alias: &str) -> Result<Arc<dyn ChatBackend>> {
        self.chat.get(alias)
    }

    /// Resolve a storage provider.
    pub fn storage_provider(&self, alias: &str) -> Result<Arc<dyn AnyStorageProvider>> {
        self.storage.get(alias)
    }

    /// The system prompt used for queries: the configured override, or
    /// [`DEFAULT_QUERY_PROMPT`].
    pub fn query_prompt(&self) -> &str {
        self.query_prompt.as_deref().unwrap_or(DEFAULT_QUERY_PROMPT)
    }

    /// Install these backends as the process-wide instance.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Config`] if backends were already installed.
    pub fn install(self) -> Result<Arc<Self>> {
        let backends = Arc::new(self);
        GLOBAL_BACKENDS.set(Arc::clone(&backends)).map_err(|_| {
            VectorIndexError::Config("vector index backends are already installed".to_string())
        })?;
        info!(
            embedding_backends = backends.embedding.len(),
            chat_backends = backends.chat.len(),
            storage_providers = backends.storage.len(),
            "installed vector index backends"
        );
        Ok(backends)
    }

    /// The process-wide instance installed with [`install`](Backends::install).
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Config`] if nothing has been installed.
    pub fn global() -> Result<Arc<Self>> {
        GLOBAL_BACKENDS.get().cloned().ok_or_else(|| {
            VectorIndexError::Config("vector index backends have not been installed".to_string())
        })
    }
}

type ProviderFactory = fn(&Map<String, Value>) -> Result<Arc<dyn AnyStorageProvider>>;

fn build_provider<P: StorageProvider>(
    raw: &Map<String, Value>,
) -> Result<Arc<dyn AnyStorageProvider>> {
    let provider: Arc<dyn AnyStorageProvider> = Arc::new(P::from_raw_config(raw)?);
    Ok(provider)
}

/// Builder for [`Backends`].
///
/// Storage providers can be registered directly, or described in
/// [`Settings`] and instantiated at [`build`](BackendsBuilder::build) time
/// from factories registered with
/// [`storage_provider_kind`](BackendsBuilder::storage_provider_kind).
pub struct BackendsBuilder {
    embedding: Registry<dyn EmbeddingBackend>,
    chat: Registry<dyn ChatBackend>,
    storage: Registry<dyn AnyStorageProvider>,
    kinds: HashMap<String, ProviderFactory>,
    settings: Settings,
}

impl Default for BackendsBuilder {
    fn default() -> Self {
        Self {
            embedding: Registry::new("embedding backend"),
            chat: Registry::new("chat backend"),
            storage: Registry::new("storage provider"),
            kinds: HashMap::new(),
            settings: Settings::default(),
        }
    }
}

impl BackendsBuilder {
    /// Register an embedding backend under `alias`.
    pub fn embedding_backend(
        mut self,
        alias: impl Into<String>,
        backend: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        self.embedding.register(alias, backend);
        self
    }

    /// Register a chat backend under `alias`.
    pub fn chat_backend(mut self, alias: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        self.chat.register(alias, backend);
        self
    }

    /// Register an already constructed storage provider under `alias`.
    pub fn storage_provider<P: StorageProvider>(
        mut self,
        alias: impl Into<String>,
        provider: P,
    ) -> Self {
        self.storage.register(alias, Arc::new(provider) as Arc<dyn AnyStorageProvider>);
        self
    }

    /// Make provider type `P` available to settings under the kind `name`.
    pub fn storage_provider_kind<P: StorageProvider>(mut self, name: impl Into<String>) -> Self {
        self.kinds.insert(name.into(), build_provider::<P>);
        self
    }

    /// Use `settings` for the query prompt and storage provider aliases.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the [`Backends`], constructing every storage provider named in
    /// the settings.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Config`] if the settings are invalid, name
    /// an unregistered provider kind, or a provider rejects its configuration.
    pub fn build(self) -> Result<Backends> {
        let BackendsBuilder { embedding, chat, mut storage, kinds, settings } = self;
        settings.validate()?;

        for (alias, provider_settings) in &settings.storage_providers {
            let factory = kinds.get(&provider_settings.provider).ok_or_else(|| {
                VectorIndexError::Config(format!(
                    "storage provider '{alias}' uses unknown provider kind '{}'",
                    provider_settings.provider
                ))
            })?;
            let provider = factory(&provider_settings.config).map_err(|e| match e {
                VectorIndexError::Config(message) => {
                    VectorIndexError::Config(format!("storage provider '{alias}': {message}"))
                }
                other => other,
            })?;
            debug!(alias = %alias, kind = %provider_settings.provider, "constructed storage provider");
            storage.register(alias.clone(), provider);
        }

        Ok(Backends { embedding, chat, storage, query_prompt: settings.query_prompt })
    }
}
