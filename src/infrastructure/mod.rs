//! Infrastructure layer - vector stores, OCR, parsing and HTTP integrations

pub mod embedding;
pub mod http_client;
pub mod ingestion;
pub mod knowledge_base;
pub mod logging;
pub mod ocr;
pub mod services;
