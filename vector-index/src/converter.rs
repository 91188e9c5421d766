//! Conversion between domain objects and [`Document`]s.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::document::Document;
use crate::embedding::EmbeddingBackend;
use crate::error::Result;

/// Translates domain objects into [`Document`]s and back.
///
/// `to_documents` is lazy: the returned stream yields documents as the
/// converter produces them (e.g. one per content chunk) and can be consumed
/// only once. `from_document` resolves a document to the object that *owns*
/// it, so several documents may map to the same object and converting an
/// object to documents and back need not reproduce the original fragments.
///
/// # Example
///
/// ```rust,ignore
/// use futures::TryStreamExt;
///
/// let documents: Vec<Document> =
///     converter.to_documents(&article, embedding.as_ref()).try_collect().await?;
/// let owner = converter.from_document(&documents[0]).await?;
/// ```
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// The domain object type this converter handles.
    type Object: Send + Sync;

    /// Split `object` into documents, embedding each fragment with `embedding_backend`.
    fn to_documents<'a>(
        &'a self,
        object: &'a Self::Object,
        embedding_backend: &'a dyn EmbeddingBackend,
    ) -> BoxStream<'a, Result<Document>>;

    /// Resolve `document` to the object it was derived from.
    async fn from_document(&self, document: &Document) -> Result<Self::Object>;

    /// Batched form of [`to_documents`](DocumentConverter::to_documents).
    ///
    /// Documents are yielded object by object, in input order.
    fn bulk_to_documents<'a>(
        &'a self,
        objects: &'a [Self::Object],
        embedding_backend: &'a dyn EmbeddingBackend,
    ) -> BoxStream<'a, Result<Document>> {
        stream::iter(objects)
            .flat_map(move |object| self.to_documents(object, embedding_backend))
            .boxed()
    }

    /// Batched form of [`from_document`](DocumentConverter::from_document).
    ///
    /// Returns one object per document, in input order. Converters backed by a
    /// database should override this with a single batched lookup.
    async fn bulk_from_documents(&self, documents: &[Document]) -> Result<Vec<Self::Object>> {
        let mut objects = Vec::with_capacity(documents.len());
        for document in documents {
            objects.push(self.from_document(document).await?);
        }
        Ok(objects)
    }
}
