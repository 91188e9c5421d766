//! # Article Search Example
//!
//! Builds a small in-memory vector index over articles, then searches it,
//! asks it a question and looks for related articles.
//!
//! Uses a deterministic hash-based embedding backend and a canned chat
//! backend so it runs with **zero API keys**.
//!
//! Run: `cargo run -p vector-index --example article_search`

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;
use vector_index::{
    Backends, Capability, ChatBackend, ChatMessage, ChatResponse, DEFAULT_ALIAS, Document,
    DocumentConverter, EmbeddingBackend, QueryOptions, Settings, StorageProvider, VectorIndex,
    VectorIndexError,
};

const IN_MEMORY: Capability = Capability::new("in_memory");

const SETTINGS: &str = r#"
query_prompt = "You are a helpful assistant. Answer using the context only."

[storage_providers.default]
provider = "in_memory"
collection = "articles"
"#;

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Deterministic hash-based embeddings for demos.
struct HashEmbedding {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingBackend for HashEmbedding {
    async fn embed(&self, texts: &[String]) -> vector_index::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let hash =
                    text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
                // Reduce before casting so `+ i` survives f32 rounding.
                let seed = (hash % 10_007) as f32;
                let mut emb = vec![0.0f32; self.dimensions];
                for (i, v) in emb.iter_mut().enumerate() {
                    *v = (seed + i as f32).sin();
                }
                let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    emb.iter_mut().for_each(|x| *x /= norm);
                }
                emb
            })
            .collect())
    }
}

/// Replies with the first line of context instead of calling a model.
struct ContextEchoChat;

#[async_trait]
impl ChatBackend for ContextEchoChat {
    async fn chat(&self, messages: &[ChatMessage]) -> vector_index::Result<ChatResponse> {
        let context = messages.get(1).map(|m| m.content.as_str()).unwrap_or_default();
        let first_line = context.lines().next().unwrap_or("I don't know.");
        Ok(ChatResponse { text: first_line.to_string(), model: Some("context-echo".into()) })
    }
}

#[derive(Debug, Deserialize)]
struct InMemoryConfig {
    collection: String,
}

struct InMemoryProvider {
    config: InMemoryConfig,
}

impl StorageProvider for InMemoryProvider {
    type Config = InMemoryConfig;
    const CAPABILITY: Capability = IN_MEMORY;

    fn new(config: InMemoryConfig) -> vector_index::Result<Self> {
        Ok(Self { config })
    }

    fn config(&self) -> &InMemoryConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Domain objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Article {
    id: i64,
    title: String,
    body: String,
}

/// One document per sentence; `embedding_pk` is `article_id * 1000 + sentence`.
struct ArticleConverter {
    articles: HashMap<i64, Article>,
}

#[async_trait]
impl DocumentConverter for ArticleConverter {
    type Object = Article;

    fn to_documents<'a>(
        &'a self,
        object: &'a Article,
        embedding_backend: &'a dyn EmbeddingBackend,
    ) -> BoxStream<'a, vector_index::Result<Document>> {
        let sentences: Vec<String> = object
            .body
            .split_inclusive('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        stream::iter(sentences.into_iter().enumerate())
            .then(move |(i, sentence)| async move {
                let vector = embedding_backend.embed_one(&sentence).await?.ok_or_else(|| {
                    VectorIndexError::Conversion(format!("no embedding for '{sentence}'"))
                })?;
                let mut metadata = Map::new();
                metadata.insert("content".into(), Value::String(sentence));
                metadata.insert("title".into(), Value::String(object.title.clone()));
                Ok::<_, VectorIndexError>(Document::new(vector, object.id * 1000 + i as i64, metadata))
            })
            .boxed()
    }

    async fn from_document(&self, document: &Document) -> vector_index::Result<Article> {
        let id = document.embedding_pk() / 1000;
        self.articles
            .get(&id)
            .cloned()
            .ok_or_else(|| VectorIndexError::Conversion(format!("no article with id {id}")))
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

struct ArticleIndex {
    converter: Arc<ArticleConverter>,
    articles: Vec<Article>,
    documents: RwLock<HashMap<i64, Document>>,
}

#[async_trait]
impl VectorIndex for ArticleIndex {
    type Object = Article;

    fn capabilities(&self) -> &[Capability] {
        &[IN_MEMORY]
    }

    fn get_converter(
        &self,
    ) -> vector_index::Result<Arc<dyn DocumentConverter<Object = Article>>> {
        Ok(self.converter.clone() as Arc<dyn DocumentConverter<Object = Article>>)
    }

    fn get_documents(
        &self,
    ) -> vector_index::Result<BoxStream<'_, vector_index::Result<Document>>> {
        let embedding_backend = self.get_embedding_backend()?;
        let converter = self.converter.clone();
        let articles = self.articles.clone();
        // The stream owns its backend handle so it can outlive this call.
        let documents = async move {
            converter
                .bulk_to_documents(&articles, embedding_backend.as_ref())
                .try_collect::<Vec<_>>()
                .await
        };
        Ok(stream::once(documents)
            .map_ok(|documents| stream::iter(documents.into_iter().map(Ok::<_, VectorIndexError>)))
            .try_flatten()
            .boxed())
    }

    async fn rebuild_index(&self) -> vector_index::Result<()> {
        let provider = self.get_typed_storage_provider::<InMemoryProvider>()?;
        let documents: Vec<Document> = self.get_documents()?.try_collect().await?;
        self.clear().await?;
        self.upsert(&documents).await?;
        tracing::info!(
            collection = %provider.config().collection,
            documents = documents.len(),
            "rebuilt index"
        );
        Ok(())
    }

    async fn upsert(&self, documents: &[Document]) -> vector_index::Result<()> {
        let mut store = self.documents.write().await;
        for document in documents {
            store.insert(document.embedding_pk(), document.clone());
        }
        Ok(())
    }

    async fn clear(&self) -> vector_index::Result<()> {
        self.documents.write().await.clear();
        Ok(())
    }

    async fn delete(&self, document_ids: &[String]) -> vector_index::Result<()> {
        let mut store = self.documents.write().await;
        for id in document_ids {
            let pk: i64 = id.parse().map_err(|_| {
                VectorIndexError::InvalidInput(format!("'{id}' is not a document id"))
            })?;
            store.remove(&pk);
        }
        Ok(())
    }

    async fn get_similar_documents(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> vector_index::Result<Vec<Document>> {
        let store = self.documents.read().await;
        let mut scored: Vec<(f32, &Document)> = store
            .values()
            .map(|document| (cosine_similarity(document.vector(), query_vector), document))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, document)| document.clone()).collect())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // -- 1. Register backends and storage providers ----------------------
    Backends::builder()
        .embedding_backend(DEFAULT_ALIAS, Arc::new(HashEmbedding { dimensions: 64 }))
        .chat_backend(DEFAULT_ALIAS, Arc::new(ContextEchoChat))
        .storage_provider_kind::<InMemoryProvider>("in_memory")
        .settings(Settings::from_toml_str(SETTINGS)?.with_env_overrides())
        .build()?
        .install()?;

    // -- 2. Build the index ------------------------------------------------
    let articles = vec![
        Article {
            id: 1,
            title: "Cats".into(),
            body: "Cats are mammals. Cats purr when they are content.".into(),
        },
        Article {
            id: 2,
            title: "Rust".into(),
            body: "Rust is a systems programming language. Ownership replaces a garbage collector."
                .into(),
        },
        Article {
            id: 3,
            title: "Lions".into(),
            body: "Lions are large cats. Lions live in prides.".into(),
        },
    ];
    let converter = Arc::new(ArticleConverter {
        articles: articles.iter().map(|a| (a.id, a.clone())).collect(),
    });
    let index = ArticleIndex { converter, articles: articles.clone(), documents: RwLock::default() };
    index.rebuild_index().await?;

    // -- 3. Search, query, find similar ------------------------------------
    for query in ["Cats are mammals.", "Ownership replaces a garbage collector."] {
        let results = index.search(query, 3).await?;
        let titles: Vec<&str> = results.iter().map(|a| a.title.as_str()).collect();
        println!("search {query:?} -> {titles:?}");
    }

    let answer = index.query("Cats purr when they are content.", QueryOptions::default()).await?;
    println!("query -> {:?} (sources: {})", answer.response[0].text, answer.sources.len());

    let similar = index.find_similar(&articles[0], false, 2).await?;
    let titles: Vec<&str> = similar.iter().map(|a| a.title.as_str()).collect();
    println!("similar to {:?} -> {titles:?}", articles[0].title);

    index.delete(&["1000".to_string(), "1001".to_string()]).await?;
    let remaining = index.search("Cats are mammals.", 3).await?;
    println!("after delete -> {} source(s)", remaining.len());

    Ok(())
}
