//! rag-kb
//!
//! Knowledge base plumbing for retrieval-augmented generation:
//! - PDF loading with native text extraction plus OCR of embedded images
//! - Milvus and Postgres/pgvector vector store backends behind one trait
//! - A manager that parses, chunks, embeds and searches knowledge base files

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use config::OcrEngineKind;
use domain::embedding::{EmbeddingFunction, EmbeddingsAdapter};
use domain::ingestion::OcrEngine;
use domain::knowledge_base::{KnowledgeBaseName, VectorStoreType};
use domain::DomainError;
use infrastructure::embedding::OpenAiEmbeddingProvider;
use infrastructure::http_client::HttpClient;
use infrastructure::ingestion::{OcrPdfLoader, ParserFactory};
use infrastructure::knowledge_base::KnowledgeBaseFactory;
use infrastructure::ocr::{RapidOcrHttpEngine, TesseractOcrEngine};
use infrastructure::services::KnowledgeBaseManager;

/// Embedding function for the configured OpenAI-compatible endpoint
pub fn create_embeddings(config: &AppConfig) -> Result<Arc<dyn EmbeddingFunction>, DomainError> {
    let settings = &config.embedding;
    let client = HttpClient::with_timeout(Duration::from_secs(settings.timeout_secs))?;
    let provider = Arc::new(OpenAiEmbeddingProvider::with_base_url(
        client,
        settings.api_key.clone(),
        settings.base_url.clone(),
    ));

    let adapter = match settings.dimensions {
        Some(dimensions) => EmbeddingsAdapter::new(provider, settings.model.clone(), dimensions),
        None => EmbeddingsAdapter::for_model(provider, settings.model.clone())?,
    };

    Ok(Arc::new(adapter))
}

pub fn create_ocr_engine(config: &AppConfig) -> Result<Arc<dyn OcrEngine>, DomainError> {
    let settings = &config.ocr;

    let engine: Arc<dyn OcrEngine> = match settings.engine {
        OcrEngineKind::Tesseract => Arc::new(TesseractOcrEngine::new(
            settings.tesseract_cmd.clone(),
            settings.language.clone(),
        )),
        OcrEngineKind::RapidOcr => {
            let client = HttpClient::with_timeout(Duration::from_secs(settings.timeout_secs))?;
            Arc::new(RapidOcrHttpEngine::new(client, settings.rapidocr_url.clone()))
        }
    };

    tracing::debug!(engine = engine.engine_name(), "OCR engine ready");
    Ok(engine)
}

pub fn create_pdf_loader(config: &AppConfig) -> Result<OcrPdfLoader, DomainError> {
    Ok(OcrPdfLoader::new(create_ocr_engine(config)?).with_options(config.partition.clone()))
}

pub fn create_parser_factory(config: &AppConfig) -> Result<ParserFactory, DomainError> {
    Ok(ParserFactory::new().with_pdf_loader(create_pdf_loader(config)?))
}

/// Manager for `kb_name` on `vs_type`, or the configured default store
pub fn create_manager(
    config: &AppConfig,
    kb_name: KnowledgeBaseName,
    vs_type: Option<VectorStoreType>,
) -> Result<KnowledgeBaseManager, DomainError> {
    let vs_type = vs_type.unwrap_or(config.kbs.default_vs_type);
    let embeddings = create_embeddings(config)?;

    let backend = KnowledgeBaseFactory::create(
        kb_name,
        config.kbs.provider_config(vs_type),
        embeddings.dimensions(),
    )?;

    Ok(
        KnowledgeBaseManager::new(backend, embeddings, create_parser_factory(config)?)
            .with_settings(config.manager_settings()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;

    #[test]
    fn test_create_manager_uses_default_store() {
        let mut config = AppConfig::default();
        config.kbs.default_vs_type = VectorStoreType::Pg;

        let manager = create_manager(&config, KnowledgeBaseName::new("samples").unwrap(), None).unwrap();

        assert_eq!(manager.kb_name().as_str(), "samples");
        assert_eq!(manager.settings().top_k, 3);
        assert!(format!("{:?}", manager).contains("Pg"));
    }

    #[test]
    fn test_unknown_model_needs_dimensions() {
        let mut config = AppConfig::default();
        config.embedding = EmbeddingConfig {
            model: "in-house-embedder".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            create_embeddings(&config).unwrap_err(),
            DomainError::Configuration { .. }
        ));

        config.embedding.dimensions = Some(384);
        assert_eq!(create_embeddings(&config).unwrap().dimensions(), 384);
    }

    #[test]
    fn test_parser_factory_supports_pdf() {
        let mut config = AppConfig::default();
        config.ocr.engine = OcrEngineKind::RapidOcr;

        let factory = create_parser_factory(&config).unwrap();

        assert!(factory.supported_extensions().contains(&"pdf"));
    }
}
