//! Document parser trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

use super::parser_type::{detect_parser_from_filename, ParserType};
use crate::domain::DomainError;

/// Raw file contents handed to a parser
#[derive(Debug, Clone)]
pub struct ParserInput {
    pub bytes: Vec<u8>,
    /// Path or name recorded as the document source
    pub source: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl ParserInput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            source: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Contents decoded as UTF-8
    pub fn utf8(&self) -> Result<&str, DomainError> {
        std::str::from_utf8(&self.bytes)
            .map_err(|e| DomainError::validation(format!("Invalid UTF-8: {}", e)))
    }
}

/// Metadata a parser attaches to its output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DocumentMetadata {
    /// Seeded from the input's source and caller-supplied metadata
    pub fn for_input(input: &ParserInput) -> Self {
        Self {
            source: input.source.clone(),
            page_count: None,
            extra: input.metadata.clone(),
        }
    }

    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = Some(page_count);
        self
    }

    /// Key/value form stored next to a document's text
    pub fn to_json_map(&self) -> HashMap<String, Value> {
        let mut map = self.extra.clone();

        if let Some(source) = &self.source {
            map.insert("source".to_string(), Value::String(source.clone()));
        }
        if let Some(page_count) = self.page_count {
            map.insert("page_count".to_string(), Value::from(page_count));
        }

        map
    }
}

/// Text pulled out of one file
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl ParsedDocument {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    fn parser_type(&self) -> ParserType;

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError>;

    /// Whether the file's extension maps to this parser
    fn supports_file(&self, filename: &str) -> bool {
        detect_parser_from_filename(filename) == Some(self.parser_type())
    }
}
