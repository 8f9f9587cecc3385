//! File-level knowledge base workflow on top of a vector store backend

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::domain::embedding::EmbeddingFunction;
use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy, ParserInput};
use crate::domain::knowledge_base::{
    validate_top_k, Document, KnowledgeBaseName, KnowledgeBaseService, KnowledgeFile,
    ScoredDocument, SOURCE_KEY,
};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::{ParserFactory, RecursiveChunker};

/// Default number of search results
pub const DEFAULT_TOP_K: usize = 3;

/// Default minimum similarity score of search results
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.0;

/// Search defaults and chunking parameters of a manager
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub score_threshold: f32,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Turns knowledge base files into stored chunks and answers searches.
///
/// The backend is initialized on first use.
pub struct KnowledgeBaseManager {
    backend: Arc<dyn KnowledgeBaseService>,
    embeddings: Arc<dyn EmbeddingFunction>,
    parsers: ParserFactory,
    chunker: Arc<dyn ChunkingStrategy>,
    settings: ManagerSettings,
    initialized: OnceCell<()>,
}

impl std::fmt::Debug for KnowledgeBaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseManager")
            .field("kb_name", self.backend.kb_name())
            .field("vs_type", &self.backend.vs_type())
            .field("settings", &self.settings)
            .finish()
    }
}

impl KnowledgeBaseManager {
    pub fn new(
        backend: Arc<dyn KnowledgeBaseService>,
        embeddings: Arc<dyn EmbeddingFunction>,
        parsers: ParserFactory,
    ) -> Self {
        Self {
            backend,
            embeddings,
            parsers,
            chunker: Arc::new(RecursiveChunker::new()),
            settings: ManagerSettings::default(),
            initialized: OnceCell::new(),
        }
    }

    pub fn with_settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn kb_name(&self) -> &KnowledgeBaseName {
        self.backend.kb_name()
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    async fn ensure_init(&self) -> Result<(), DomainError> {
        self.initialized
            .get_or_try_init(|| self.backend.do_init())
            .await?;
        Ok(())
    }

    pub async fn create_kb(&self) -> Result<(), DomainError> {
        self.ensure_init().await?;
        self.backend.do_create_kb().await?;

        tracing::info!(kb_name = %self.kb_name(), vs_type = %self.backend.vs_type(), "Knowledge base created");
        Ok(())
    }

    pub async fn drop_kb(&self) -> Result<(), DomainError> {
        self.ensure_init().await?;
        self.backend.do_drop_kb().await?;

        tracing::info!(kb_name = %self.kb_name(), "Knowledge base dropped");
        Ok(())
    }

    pub async fn clear_vs(&self) -> Result<(), DomainError> {
        self.ensure_init().await?;
        self.backend.do_clear_vs().await?;

        tracing::info!(kb_name = %self.kb_name(), "Vector store cleared");
        Ok(())
    }

    /// Split a file into chunk documents, each tagged with the file path as source
    pub async fn file_to_documents(&self, kb_file: &KnowledgeFile) -> Result<Vec<Document>, DomainError> {
        let path = kb_file.filepath();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DomainError::not_found(format!("File not found: {}", path.display()))
            }
            _ => DomainError::extraction(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        let parser = self.parsers.for_filename(kb_file.filename())?;
        let parsed = parser
            .parse(ParserInput::new(bytes).with_source(kb_file.filename()))
            .await?;

        let mut metadata = parsed.metadata.to_json_map();
        metadata.insert(SOURCE_KEY.to_string(), serde_json::json!(kb_file.source()));

        let chunks = self.chunker.chunk(&parsed.content, &self.settings.chunking)?;

        tracing::debug!(
            kb_name = %self.kb_name(),
            file = kb_file.filename(),
            chunks = chunks.len(),
            chunker = self.chunker.name(),
            "Split file into chunks"
        );

        Ok(chunks
            .into_iter()
            .map(|chunk| Document {
                page_content: chunk.content,
                metadata: metadata.clone(),
            })
            .collect())
    }

    /// Parse, chunk and store a file; returns the ids of the stored chunks
    pub async fn add_doc(&self, kb_file: &KnowledgeFile) -> Result<Vec<String>, DomainError> {
        self.ensure_init().await?;

        let docs = self.file_to_documents(kb_file).await?;

        if docs.is_empty() {
            tracing::warn!(kb_name = %self.kb_name(), file = kb_file.filename(), "File produced no text");
            return Ok(Vec::new());
        }

        let ids = self.backend.do_add_doc(docs, self.embeddings.as_ref()).await?;

        tracing::info!(kb_name = %self.kb_name(), file = kb_file.filename(), chunks = ids.len(), "Added file");
        Ok(ids)
    }

    /// Remove every chunk stored for a file
    pub async fn delete_doc(&self, kb_file: &KnowledgeFile) -> Result<usize, DomainError> {
        self.ensure_init().await?;

        let removed = self.backend.do_delete_doc(kb_file).await?;

        tracing::info!(kb_name = %self.kb_name(), file = kb_file.filename(), removed, "Deleted file");
        Ok(removed)
    }

    /// Replace the stored chunks of a file with its current content
    pub async fn update_doc(&self, kb_file: &KnowledgeFile) -> Result<Vec<String>, DomainError> {
        self.delete_doc(kb_file).await?;
        self.add_doc(kb_file).await
    }

    pub async fn search_docs(
        &self,
        query: &str,
        top_k: Option<usize>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredDocument>, DomainError> {
        let top_k = top_k.unwrap_or(self.settings.top_k);
        validate_top_k(top_k)?;
        let score_threshold = score_threshold.unwrap_or(self.settings.score_threshold);

        self.ensure_init().await?;

        self.backend
            .do_search(query, top_k, score_threshold, self.embeddings.as_ref())
            .await
    }
}
