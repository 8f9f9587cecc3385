//! Knowledge base backend factory

use std::sync::Arc;
use std::time::Duration;

use crate::domain::knowledge_base::{KnowledgeBaseName, KnowledgeBaseService, VectorStoreType};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClient;

use super::milvus::{MilvusConfig, MilvusKnowledgeBaseService};
use super::pgvector::{PgVectorConfig, PgVectorKnowledgeBaseService};

/// Factory for creating knowledge base backends
#[derive(Debug)]
pub struct KnowledgeBaseFactory;

impl KnowledgeBaseFactory {
    /// Create a Milvus backend talking to the REST API with its own HTTP client
    pub fn create_milvus(
        name: KnowledgeBaseName,
        config: MilvusConfig,
        dimensions: usize,
    ) -> Result<Arc<dyn KnowledgeBaseService>, DomainError> {
        let http = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        Ok(Arc::new(MilvusKnowledgeBaseService::new(
            name,
            Arc::new(http),
            config,
            dimensions,
        )))
    }

    /// Create a pgvector backend; the pool is opened on `do_init`
    pub fn create_pgvector(
        name: KnowledgeBaseName,
        config: PgVectorConfig,
    ) -> Arc<dyn KnowledgeBaseService> {
        Arc::new(PgVectorKnowledgeBaseService::new(name, config))
    }

    /// Create a backend from configuration
    pub fn create(
        name: KnowledgeBaseName,
        config: KnowledgeBaseProviderConfig,
        dimensions: usize,
    ) -> Result<Arc<dyn KnowledgeBaseService>, DomainError> {
        tracing::debug!(kb_name = %name, vs_type = %config.vs_type(), "Creating knowledge base backend");

        match config {
            KnowledgeBaseProviderConfig::Milvus(cfg) => Self::create_milvus(name, cfg, dimensions),
            KnowledgeBaseProviderConfig::Pg(cfg) => Ok(Self::create_pgvector(name, cfg)),
        }
    }
}

/// Connection settings for one backend type
#[derive(Debug, Clone)]
pub enum KnowledgeBaseProviderConfig {
    Milvus(MilvusConfig),
    Pg(PgVectorConfig),
}

impl KnowledgeBaseProviderConfig {
    pub fn vs_type(&self) -> VectorStoreType {
        match self {
            Self::Milvus(_) => VectorStoreType::Milvus,
            Self::Pg(_) => VectorStoreType::Pg,
        }
    }
}

impl From<MilvusConfig> for KnowledgeBaseProviderConfig {
    fn from(config: MilvusConfig) -> Self {
        Self::Milvus(config)
    }
}

impl From<PgVectorConfig> for KnowledgeBaseProviderConfig {
    fn from(config: PgVectorConfig) -> Self {
        Self::Pg(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBaseName {
        KnowledgeBaseName::new("samples").unwrap()
    }

    #[test]
    fn test_config_conversion() {
        let config: KnowledgeBaseProviderConfig = MilvusConfig::default().into();
        assert_eq!(config.vs_type(), VectorStoreType::Milvus);

        let config: KnowledgeBaseProviderConfig = PgVectorConfig::default().into();
        assert_eq!(config.vs_type(), VectorStoreType::Pg);
    }

    #[test]
    fn test_create_binds_name_and_type() {
        let milvus = KnowledgeBaseFactory::create(kb(), MilvusConfig::default().into(), 1024).unwrap();
        assert_eq!(milvus.vs_type(), VectorStoreType::Milvus);
        assert_eq!(milvus.kb_name().as_str(), "samples");

        let pg = KnowledgeBaseFactory::create(kb(), PgVectorConfig::default().into(), 1024).unwrap();
        assert_eq!(pg.vs_type(), VectorStoreType::Pg);
    }
}
