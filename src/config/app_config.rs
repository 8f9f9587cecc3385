use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::ingestion::{ChunkingConfig, PartitionOptions};
use crate::domain::knowledge_base::VectorStoreType;
use crate::infrastructure::knowledge_base::{
    KnowledgeBaseProviderConfig, MilvusConfig, PgVectorConfig,
};
use crate::infrastructure::services::{ManagerSettings, DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub kbs: KbsConfig,
    pub embedding: EmbeddingConfig,
    pub ocr: OcrConfig,
    pub chunking: ChunkingConfig,
    pub partition: PartitionOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Knowledge base storage and search defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KbsConfig {
    pub default_vs_type: VectorStoreType,
    /// Directory holding `<kb_name>/content/` folders
    pub root_path: PathBuf,
    pub top_k: usize,
    pub score_threshold: f32,
    pub milvus: MilvusConfig,
    pub pg: PgVectorConfig,
}

/// OpenAI-compatible embeddings endpoint
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Needed for models missing from the built-in table
    pub dimensions: Option<usize>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    #[default]
    Tesseract,
    RapidOcr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngineKind,
    pub tesseract_cmd: String,
    pub language: String,
    pub rapidocr_url: String,
    pub timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for KbsConfig {
    fn default() -> Self {
        Self {
            default_vs_type: VectorStoreType::Milvus,
            root_path: PathBuf::from("data/knowledge_base"),
            top_k: DEFAULT_TOP_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            milvus: MilvusConfig::default(),
            pg: PgVectorConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::default(),
            tesseract_cmd: "tesseract".to_string(),
            language: "eng".to_string(),
            rapidocr_url: "http://127.0.0.1:9003".to_string(),
            timeout_secs: 120,
        }
    }
}

impl KbsConfig {
    /// Connection settings for a backend type
    pub fn provider_config(&self, vs_type: VectorStoreType) -> KnowledgeBaseProviderConfig {
        match vs_type {
            VectorStoreType::Milvus => self.milvus.clone().into(),
            VectorStoreType::Pg => self.pg.clone().into(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            chunking: self.chunking.clone(),
            top_k: self.kbs.top_k,
            score_threshold: self.kbs.score_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::LoadMode;

    fn from_toml(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.kbs.default_vs_type, VectorStoreType::Milvus);
        assert_eq!(config.kbs.top_k, 3);
        assert_eq!(config.kbs.score_threshold, 0.0);
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.chunking, ChunkingConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = from_toml(
            r#"
            [logging]
            format = "json"

            [kbs]
            default_vs_type = "pg"
            top_k = 5

            [kbs.milvus]
            uri = "http://milvus:19530"
            db_name = "rag"

            [kbs.pg]
            connection_uri = "postgresql://kb@db/kb"

            [ocr]
            engine = "rapidocr"

            [chunking]
            chunk_size = 500
            chunk_overlap = 100

            [partition]
            mode = "elements"
            "#,
        );

        assert!(matches!(config.logging.format, LogFormat::Json));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.kbs.default_vs_type, VectorStoreType::Pg);
        assert_eq!(config.kbs.top_k, 5);
        assert_eq!(config.kbs.milvus.uri, "http://milvus:19530");
        assert_eq!(config.kbs.milvus.db_name.as_deref(), Some("rag"));
        assert_eq!(config.kbs.milvus.timeout_secs, 30);
        assert_eq!(config.kbs.pg.connection_uri, "postgresql://kb@db/kb");
        assert_eq!(config.kbs.pg.max_connections, 5);
        assert_eq!(config.ocr.engine, OcrEngineKind::RapidOcr);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.partition.mode, LoadMode::Elements);
    }

    #[test]
    fn test_provider_config_and_settings() {
        let config = AppConfig::default();

        assert_eq!(
            config.kbs.provider_config(VectorStoreType::Pg).vs_type(),
            VectorStoreType::Pg
        );

        let settings = config.manager_settings();
        assert_eq!(settings.top_k, 3);
        assert_eq!(settings.chunking.chunk_size, 250);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = EmbeddingConfig {
            api_key: Some("sk-secret".to_string()),
            ..EmbeddingConfig::default()
        };

        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
