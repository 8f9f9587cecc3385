//! Vector store backends for knowledge bases

mod factory;
mod milvus;
mod pgvector;
mod state;

pub use factory::{KnowledgeBaseFactory, KnowledgeBaseProviderConfig};
pub use milvus::{
    escape_string_literal, MilvusClient, MilvusConfig, MilvusHit, MilvusKnowledgeBaseService,
    DEFAULT_SEARCH_LIMIT,
};
pub use pgvector::{PgVectorConfig, PgVectorKnowledgeBaseService};
