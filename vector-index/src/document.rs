//! Value types exchanged with storage and chat backends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::ChatResponse;

/// Metadata key holding the text that is fed to the chat backend as context.
pub const CONTENT_KEY: &str = "content";

/// A piece of vectorized content passed to and from storage providers.
///
/// A document is usually a fragment of a domain object, so one object may own
/// several documents. `embedding_pk` is the primary key of the externally
/// owned embedding record the document was built from.
///
/// Documents are immutable once built; all fields are read through accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    vector: Vec<f32>,
    embedding_pk: i64,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl Document {
    /// Create a new document.
    pub fn new(vector: Vec<f32>, embedding_pk: i64, metadata: Map<String, Value>) -> Self {
        Self { vector, embedding_pk, metadata }
    }

    /// The embedding vector.
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Primary key of the embedding record this document refers to.
    pub fn embedding_pk(&self) -> i64 {
        self.embedding_pk
    }

    /// Arbitrary metadata attached by the converter.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The `"content"` metadata field rendered as text.
    ///
    /// String values are returned as-is; any other JSON value is rendered
    /// with its JSON representation. Returns `None` if the field is absent.
    pub fn content(&self) -> Option<String> {
        self.metadata.get(CONTENT_KEY).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

/// The result of [`VectorIndex::query`](crate::VectorIndex::query).
///
/// Pairs the generated response with the deduplicated domain objects whose
/// documents were used as context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse<T> {
    /// Generated responses; `query` always produces exactly one.
    pub response: Vec<ChatResponse>,
    /// Source objects in first-seen order.
    pub sources: Vec<T>,
}
