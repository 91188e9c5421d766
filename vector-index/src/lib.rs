//! Vector indexes for retrieval-augmented generation.
//!
//! This crate defines the contract between a searchable collection of domain
//! objects and the backends that do the real work:
//!
//! - [`EmbeddingBackend`] turns text into vectors
//! - [`StorageProvider`] owns the configuration of a vector store and declares
//!   the [`Capability`] an index needs to use it
//! - [`DocumentConverter`] maps domain objects to [`Document`]s and back
//! - [`ChatBackend`] generates answers from a prompt
//!
//! [`VectorIndex`] composes them into `search`, `query` and `find_similar`.
//! Backends are looked up by alias in a [`Backends`] registry, usually built
//! from [`Settings`] at startup.

pub mod chat;
pub mod config;
pub mod converter;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod registry;
pub mod storage;

pub use chat::{ChatBackend, ChatMessage, ChatResponse, Role};
pub use config::{QUERY_PROMPT_ENV, Settings, SettingsBuilder, StorageProviderSettings};
pub use converter::DocumentConverter;
pub use document::{CONTENT_KEY, Document, QueryResponse};
pub use embedding::EmbeddingBackend;
pub use error::{Result, VectorIndexError};
pub use index::{DEFAULT_LIMIT, QueryOptions, VectorIndex, deduplicate};
pub use registry::{
    Backends, BackendsBuilder, DEFAULT_ALIAS, DEFAULT_QUERY_PROMPT, Registry,
};
pub use storage::{AnyStorageProvider, Capability, StorageProvider, downcast_provider};
