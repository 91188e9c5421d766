//! The [`VectorIndex`] contract and its query pipeline.
//!
//! A vector index is a set of domain objects that can be searched by meaning.
//! Implementors supply the backend-specific seams (similarity search,
//! upserts, the document converter); the trait provides the orchestration on
//! top of them:
//!
//! - [`search`](VectorIndex::search): embed → similar documents → source objects
//! - [`query`](VectorIndex::query): as `search`, then answer the question with a
//!   chat backend using the matched content as context
//! - [`find_similar`](VectorIndex::find_similar): objects similar to a given object
//!
//! Backends, the converter and the storage provider are resolved on every
//! call, so reconfiguring an alias takes effect without rebuilding the index.
//!
//! # Example
//!
//! ```rust,ignore
//! use vector_index::{QueryOptions, VectorIndex};
//!
//! let articles = index.search("cats", 5).await?;
//! let answer = index.query("Do cats purr?", QueryOptions::default()).await?;
//! println!("{}", answer.response[0].text);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use tracing::{debug, info};

use crate::chat::ChatMessage;
use crate::converter::DocumentConverter;
use crate::document::{CONTENT_KEY, Document, QueryResponse};
use crate::embedding::EmbeddingBackend;
use crate::error::{Result, VectorIndexError};
use crate::registry::{Backends, DEFAULT_ALIAS};
use crate::storage::{AnyStorageProvider, Capability, StorageProvider, downcast_provider};

/// Number of similar documents fetched when the caller does not say otherwise.
pub const DEFAULT_LIMIT: usize = 5;

/// Per-call options for [`VectorIndex::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of similar documents used as context and sources.
    pub sources_limit: usize,
    /// Alias of the chat backend that generates the answer.
    pub chat_backend_alias: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { sources_limit: DEFAULT_LIMIT, chat_backend_alias: DEFAULT_ALIAS.to_string() }
    }
}

impl QueryOptions {
    /// Set the maximum number of similar documents to retrieve.
    pub fn sources_limit(mut self, limit: usize) -> Self {
        self.sources_limit = limit;
        self
    }

    /// Set the chat backend alias.
    pub fn chat_backend_alias(mut self, alias: impl Into<String>) -> Self {
        self.chat_backend_alias = alias.into();
        self
    }
}

/// Remove duplicates from `objects`, keeping the first occurrence of each
/// value, and drop every value equal to one of `exclusions`.
///
/// Equality is the object's own [`PartialEq`]; this is exact deduplication,
/// not near-duplicate merging.
pub fn deduplicate<T: PartialEq>(objects: impl IntoIterator<Item = T>, exclusions: &[T]) -> Vec<T> {
    let mut unique: Vec<T> = Vec::new();
    for object in objects {
        if exclusions.contains(&object) || unique.contains(&object) {
            continue;
        }
        unique.push(object);
    }
    unique
}

/// Join the `"content"` field of every document with newlines.
///
/// Duplicated content is kept; only sources are deduplicated.
fn merge_context(documents: &[Document]) -> Result<String> {
    let parts = documents
        .iter()
        .map(|document| {
            document.content().ok_or(VectorIndexError::MissingMetadata {
                embedding_pk: document.embedding_pk(),
                key: CONTENT_KEY,
            })
        })
        .collect::<Result<Vec<String>>>()?;
    Ok(parts.join("\n"))
}

async fn embed_query(backend: &dyn EmbeddingBackend, text: &str) -> Result<Vec<f32>> {
    backend.embed_one(text).await?.ok_or_else(|| {
        VectorIndexError::InvalidInput("No embeddings were generated for the given query.".into())
    })
}

/// A queryable collection of domain objects backed by vector storage.
///
/// Implementations must provide [`get_converter`](VectorIndex::get_converter)
/// and [`get_similar_documents`](VectorIndex::get_similar_documents) for the
/// public operations to work; the remaining storage seams are optional.
/// Every seam that is not overridden returns
/// [`VectorIndexError::NotImplemented`].
///
/// An index declares the [`Capability`]s it implements. Before any storage
/// operation the index resolves its storage provider and checks that the
/// provider's required capability is among them.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The domain object type this index returns.
    type Object: PartialEq + Send + Sync + 'static;

    /// Alias of the embedding backend used for documents and queries.
    fn embedding_backend_alias(&self) -> &str {
        DEFAULT_ALIAS
    }

    /// Alias of the storage provider holding this index's vectors.
    fn storage_provider_alias(&self) -> &str {
        DEFAULT_ALIAS
    }

    /// Capabilities this index implements.
    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    /// The registries aliases are resolved against.
    ///
    /// Defaults to the process-wide [`Backends::global`] instance.
    fn backends(&self) -> Result<Arc<Backends>> {
        Backends::global()
    }

    /// Resolve the embedding backend by alias.
    fn get_embedding_backend(&self) -> Result<Arc<dyn EmbeddingBackend>> {
        self.backends()?.embedding_backend(self.embedding_backend_alias())
    }

    /// Resolve the storage provider by alias and check capability compatibility.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::CapabilityMismatch`] if this index does not
    /// implement the capability the provider requires.
    fn get_storage_provider(&self) -> Result<Arc<dyn AnyStorageProvider>> {
        let alias = self.storage_provider_alias();
        let provider = self.backends()?.storage_provider(alias)?;
        let required = provider.required_capability();
        if !self.capabilities().contains(&required) {
            return Err(VectorIndexError::CapabilityMismatch {
                alias: alias.to_string(),
                required: required.name().to_string(),
            });
        }
        Ok(provider)
    }

    /// As [`get_storage_provider`](VectorIndex::get_storage_provider), then
    /// downcast to the concrete provider type.
    fn get_typed_storage_provider<P: StorageProvider>(&self) -> Result<Arc<P>>
    where
        Self: Sized,
    {
        downcast_provider(self.get_storage_provider()?)
    }

    // Backend-specific seams

    /// The converter between domain objects and documents.
    fn get_converter(&self) -> Result<Arc<dyn DocumentConverter<Object = Self::Object>>> {
        Err(VectorIndexError::NotImplemented { operation: "get_converter" })
    }

    /// Every document that belongs in this index.
    fn get_documents(&self) -> Result<BoxStream<'_, Result<Document>>> {
        Err(VectorIndexError::NotImplemented { operation: "get_documents" })
    }

    /// Rebuild the index in the storage backend from scratch.
    async fn rebuild_index(&self) -> Result<()> {
        Err(VectorIndexError::NotImplemented { operation: "rebuild_index" })
    }

    /// Insert or replace documents in the storage backend.
    async fn upsert(&self, _documents: &[Document]) -> Result<()> {
        Err(VectorIndexError::NotImplemented { operation: "upsert" })
    }

    /// Remove every document from the storage backend.
    async fn clear(&self) -> Result<()> {
        Err(VectorIndexError::NotImplemented { operation: "clear" })
    }

    /// Remove documents by ID from the storage backend.
    async fn delete(&self, _document_ids: &[String]) -> Result<()> {
        Err(VectorIndexError::NotImplemented { operation: "delete" })
    }

    /// Fetch at most `limit` documents most similar to `query_vector`.
    async fn get_similar_documents(
        &self,
        _query_vector: &[f32],
        _limit: usize,
    ) -> Result<Vec<Document>> {
        Err(VectorIndexError::NotImplemented { operation: "get_similar_documents" })
    }

    // Public API

    /// Answer a natural language question using the indexed content.
    ///
    /// The `"content"` of every matched document becomes context for the
    /// chat backend named in `options`; the returned sources are the
    /// deduplicated objects owning those documents.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::InvalidInput`] if the query text produced
    /// no embedding, [`VectorIndexError::MissingMetadata`] if a matched
    /// document has no `"content"`, and any error from the resolved backends.
    async fn query(&self, query: &str, options: QueryOptions) -> Result<QueryResponse<Self::Object>> {
        let backends = self.backends()?;
        let query_vector = embed_query(self.get_embedding_backend()?.as_ref(), query).await?;

        self.get_storage_provider()?;
        let similar_documents =
            self.get_similar_documents(&query_vector, options.sources_limit).await?;

        let converter = self.get_converter()?;
        let sources = deduplicate(converter.bulk_from_documents(&similar_documents).await?, &[]);

        let merged_context = merge_context(&similar_documents)?;
        let messages = vec![
            ChatMessage::system(backends.query_prompt()),
            ChatMessage::system(merged_context),
            ChatMessage::user(query),
        ];

        let chat_backend = backends.chat_backend(&options.chat_backend_alias)?;
        let response = chat_backend.chat(&messages).await?;

        info!(
            documents = similar_documents.len(),
            sources = sources.len(),
            chat_backend = %options.chat_backend_alias,
            "query completed"
        );

        Ok(QueryResponse { response: vec![response], sources })
    }

    /// Return the objects whose documents are most similar to `query`.
    ///
    /// At most `limit` documents are fetched; objects owning several of them
    /// appear once, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::InvalidInput`] if the query text produced
    /// no embedding, and any error from the resolved backends.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Self::Object>> {
        let query_vector = embed_query(self.get_embedding_backend()?.as_ref(), query).await?;

        self.get_storage_provider()?;
        let similar_documents = self.get_similar_documents(&query_vector, limit).await?;

        let sources = deduplicate(
            self.get_converter()?.bulk_from_documents(&similar_documents).await?,
            &[],
        );
        debug!(documents = similar_documents.len(), sources = sources.len(), "search completed");
        Ok(sources)
    }

    /// Return objects similar to `object`.
    ///
    /// Every document the converter produces for `object` is used as a query
    /// vector, fetching up to `limit` documents each; the accumulated matches
    /// are deduplicated in first-seen order. `limit` bounds each fetch, not
    /// the combined result. Unless `include_self` is set, `object` itself is
    /// excluded.
    ///
    /// # Errors
    ///
    /// Returns any error from the converter or the resolved backends.
    async fn find_similar(
        &self,
        object: &Self::Object,
        include_self: bool,
        limit: usize,
    ) -> Result<Vec<Self::Object>> {
        let converter = self.get_converter()?;
        let embedding_backend = self.get_embedding_backend()?;
        let mut object_documents = converter.to_documents(object, embedding_backend.as_ref());

        self.get_storage_provider()?;
        let mut similar_documents = Vec::new();
        let mut object_document_count = 0usize;
        while let Some(document) = object_documents.try_next().await? {
            object_document_count += 1;
            similar_documents.extend(self.get_similar_documents(document.vector(), limit).await?);
        }

        let exclusions = if include_self { &[][..] } else { std::slice::from_ref(object) };
        let similar =
            deduplicate(converter.bulk_from_documents(&similar_documents).await?, exclusions);
        debug!(
            object_documents = object_document_count,
            documents = similar_documents.len(),
            similar = similar.len(),
            include_self,
            "find_similar completed"
        );
        Ok(similar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn document(pk: i64, content: Option<&str>) -> Document {
        let mut metadata = Map::new();
        if let Some(content) = content {
            metadata.insert(CONTENT_KEY.to_string(), Value::String(content.to_string()));
        }
        Document::new(vec![0.0], pk, metadata)
    }

    #[test]
    fn deduplicate_keeps_first_occurrence_order() {
        assert_eq!(deduplicate(vec![3, 1, 3, 2, 1], &[]), vec![3, 1, 2]);
    }

    #[test]
    fn deduplicate_drops_exclusions_anywhere() {
        assert_eq!(deduplicate(vec![1, 2, 1, 3, 2], &[2]), vec![1, 3]);
        assert_eq!(deduplicate(vec![2, 2, 2], &[2]), Vec::<i32>::new());
    }

    #[test]
    fn deduplicate_empty_input() {
        assert!(deduplicate(Vec::<String>::new(), &["x".to_string()]).is_empty());
    }

    #[test]
    fn merge_context_joins_every_document() {
        let documents = vec![
            document(1, Some("Cats are mammals.")),
            document(2, Some("Cats purr.")),
            document(3, Some("Cats purr.")),
        ];
        assert_eq!(
            merge_context(&documents).unwrap(),
            "Cats are mammals.\nCats purr.\nCats purr."
        );
    }

    #[test]
    fn merge_context_requires_content() {
        let err = merge_context(&[document(1, Some("a")), document(9, None)]).err().unwrap();
        assert!(matches!(
            err,
            VectorIndexError::MissingMetadata { embedding_pk: 9, key: CONTENT_KEY }
        ));
    }

    #[test]
    fn merge_context_of_nothing_is_empty() {
        assert_eq!(merge_context(&[]).unwrap(), "");
    }

    #[test]
    fn query_options_builder() {
        let options = QueryOptions::default().sources_limit(2).chat_backend_alias("fast");
        assert_eq!(options.sources_limit, 2);
        assert_eq!(options.chat_backend_alias, "fast");
        assert_eq!(QueryOptions::default().sources_limit, DEFAULT_LIMIT);
    }
}
