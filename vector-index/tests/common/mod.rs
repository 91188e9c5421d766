//! Shared test doubles: scripted backends, an article converter and an index
//! whose storage seam returns canned documents.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use vector_index::{
    Backends, Capability, ChatBackend, ChatMessage, ChatResponse, DEFAULT_ALIAS, Document,
    DocumentConverter, EmbeddingBackend, Result, StorageProvider, VectorIndex, VectorIndexError,
};

pub const MEMORY: Capability = Capability::new("memory");

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: u32,
    pub title: String,
}

pub fn article(id: u32) -> Article {
    Article { id, title: format!("Article {id}") }
}

pub fn document(pk: i64, vector: Vec<f32>, content: &str) -> Document {
    let metadata = json!({ "content": content }).as_object().cloned().unwrap();
    Document::new(vector, pk, metadata)
}

/// Returns a fixed vector per known text; a batch containing an unknown text
/// comes back empty.
#[derive(Default)]
pub struct ScriptedEmbedding {
    vectors: HashMap<String, Vec<f32>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEmbedding {
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingBackend for ScriptedEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push(texts.to_vec());
        let vectors: Option<Vec<Vec<f32>>> =
            texts.iter().map(|text| self.vectors.get(text).cloned()).collect();
        Ok(vectors.unwrap_or_default())
    }
}

/// Records every request and answers with a fixed reply.
pub struct RecordingChat {
    reply: String,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingChat {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for RecordingChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(ChatResponse::new(self.reply.clone()))
    }
}

/// Articles are split into numbered chunks; each chunk is one document whose
/// `embedding_pk` resolves back to the owning article.
#[derive(Default)]
pub struct ArticleConverter {
    chunks: HashMap<u32, Vec<(i64, String)>>,
    owners: HashMap<i64, Article>,
}

impl ArticleConverter {
    pub fn with_chunk(mut self, owner: Article, embedding_pk: i64, content: &str) -> Self {
        self.chunks.entry(owner.id).or_default().push((embedding_pk, content.to_string()));
        self.owners.insert(embedding_pk, owner);
        self
    }
}

#[async_trait]
impl DocumentConverter for ArticleConverter {
    type Object = Article;

    fn to_documents<'a>(
        &'a self,
        object: &'a Article,
        embedding_backend: &'a dyn EmbeddingBackend,
    ) -> BoxStream<'a, Result<Document>> {
        let chunks = self.chunks.get(&object.id).map(Vec::as_slice).unwrap_or_default();
        stream::iter(chunks)
            .then(move |(pk, content)| async move {
                let vector = embedding_backend.embed_one(content).await?.ok_or_else(|| {
                    VectorIndexError::Conversion(format!("no embedding for chunk {pk}"))
                })?;
                Ok::<_, VectorIndexError>(document(*pk, vector, content))
            })
            .boxed()
    }

    async fn from_document(&self, document: &Document) -> Result<Article> {
        self.owners.get(&document.embedding_pk()).cloned().ok_or_else(|| {
            VectorIndexError::Conversion(format!(
                "no article owns embedding {}",
                document.embedding_pk()
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MemoryConfig {
    pub collection: String,
}

pub struct MemoryProvider {
    config: MemoryConfig,
}

impl StorageProvider for MemoryProvider {
    type Config = MemoryConfig;
    const CAPABILITY: Capability = MEMORY;

    fn new(config: MemoryConfig) -> Result<Self> {
        Ok(Self { config })
    }

    fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

pub fn memory_provider() -> MemoryProvider {
    let raw: Map<String, Value> = json!({"collection": "articles"}).as_object().cloned().unwrap();
    MemoryProvider::from_raw_config(&raw).unwrap()
}

/// An index whose similarity search returns the same canned documents for
/// every vector, truncated to the requested limit.
pub struct ArticleIndex {
    pub backends: Arc<Backends>,
    pub converter: Arc<ArticleConverter>,
    pub similar: Vec<Document>,
    pub capabilities: Vec<Capability>,
    pub storage_calls: Mutex<Vec<(Vec<f32>, usize)>>,
}

impl ArticleIndex {
    pub fn new(backends: Arc<Backends>, converter: ArticleConverter, similar: Vec<Document>) -> Self {
        Self {
            backends,
            converter: Arc::new(converter),
            similar,
            capabilities: vec![MEMORY],
            storage_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn storage_calls(&self) -> Vec<(Vec<f32>, usize)> {
        self.storage_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for ArticleIndex {
    type Object = Article;

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn backends(&self) -> Result<Arc<Backends>> {
        Ok(Arc::clone(&self.backends))
    }

    fn get_converter(&self) -> Result<Arc<dyn DocumentConverter<Object = Article>>> {
        Ok(self.converter.clone() as Arc<dyn DocumentConverter<Object = Article>>)
    }

    async fn get_similar_documents(&self, query_vector: &[f32], limit: usize) -> Result<Vec<Document>> {
        let provider = self.get_typed_storage_provider::<MemoryProvider>()?;
        assert_eq!(provider.config().collection, "articles");
        self.storage_calls.lock().unwrap().push((query_vector.to_vec(), limit));
        Ok(self.similar.iter().take(limit).cloned().collect())
    }
}

pub struct Fixture {
    pub embedding: Arc<ScriptedEmbedding>,
    pub chat: Arc<RecordingChat>,
    pub backends: Arc<Backends>,
}

pub fn fixture(embedding: ScriptedEmbedding) -> Fixture {
    fixture_with_prompt(embedding, None)
}

pub fn fixture_with_prompt(embedding: ScriptedEmbedding, prompt: Option<&str>) -> Fixture {
    let embedding = Arc::new(embedding);
    let chat = Arc::new(RecordingChat::new("Yes, cats purr."));
    let mut settings = vector_index::Settings::builder();
    if let Some(prompt) = prompt {
        settings = settings.query_prompt(prompt);
    }
    let backends = Backends::builder()
        .embedding_backend(DEFAULT_ALIAS, embedding.clone())
        .chat_backend(DEFAULT_ALIAS, chat.clone())
        .storage_provider(DEFAULT_ALIAS, memory_provider())
        .settings(settings.build().unwrap())
        .build()
        .unwrap();
    Fixture { embedding, chat, backends: Arc::new(backends) }
}

/// A provider of a different concrete type sharing the `memory` capability.
pub struct OtherProvider;

impl StorageProvider for OtherProvider {
    type Config = MemoryConfig;
    const CAPABILITY: Capability = MEMORY;

    fn new(_config: MemoryConfig) -> Result<Self> {
        Ok(Self)
    }

    fn config(&self) -> &MemoryConfig {
        unreachable!("never constructed in tests")
    }
}
