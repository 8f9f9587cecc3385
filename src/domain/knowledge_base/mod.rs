//! Knowledge base domain - documents, files and the vector store contract

mod document;
mod knowledge_file;
mod name;
mod service;

pub use document::{Document, ScoredDocument, SOURCE_KEY};
pub use knowledge_file::{KnowledgeFile, CONTENT_DIR};
pub use name::{
    validate_knowledge_base_name, validate_top_k, KnowledgeBaseName,
    KnowledgeBaseValidationError,
};
pub use service::{
    euclidean_similarity, score_threshold_process, KnowledgeBaseService, VectorStoreType,
};

#[cfg(test)]
pub use service::mock::InMemoryKnowledgeBaseService;
