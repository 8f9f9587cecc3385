//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, KbsConfig, LogFormat, LoggingConfig, OcrConfig, OcrEngineKind,
};
