//! Domain layer - knowledge bases, ingestion and embedding contracts

pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;

pub use embedding::{EmbeddingFunction, EmbeddingProvider, EmbeddingRequest, EmbeddingsAdapter};
pub use error::DomainError;
pub use ingestion::{
    Chunk, ChunkingConfig, ChunkingStrategy, DocumentMetadata, DocumentParser, Element,
    ElementCategory, LoadMode, OcrEngine, OcrLine, ParsedDocument, ParserInput, ParserType,
    PartitionOptions, RasterImage,
};
pub use knowledge_base::{
    Document, KnowledgeBaseName, KnowledgeBaseService, KnowledgeFile, ScoredDocument,
    VectorStoreType,
};
