//! Embedding backend trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding model behind a unified async
/// interface. Indexes resolve them by alias from a
/// [`Backends`](crate::Backends) registry on every call, so a backend can be
/// reconfigured without rebuilding the index.
///
/// # Example
///
/// ```rust,ignore
/// use vector_index::EmbeddingBackend;
///
/// let backend = MyEmbeddingBackend::new();
/// let vectors = backend.embed(&["hello world".to_string()]).await?;
/// assert_eq!(vectors.len(), 1);
/// ```
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate one embedding per input string, in input order.
    ///
    /// The result is either one vector per input or empty, when the backend
    /// could not embed the batch at all.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate the embedding for a single string.
    ///
    /// Returns `Ok(None)` when the backend returned an empty batch for `text`.
    async fn embed_one(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.is_empty() { Ok(None) } else { Ok(Some(vectors.swap_remove(0))) }
    }
}
