//! Plain text and markdown parser

use async_trait::async_trait;

use crate::domain::ingestion::{
    DocumentMetadata, DocumentParser, ParsedDocument, ParserInput, ParserType,
};
use crate::domain::DomainError;

const UTF8_BOM: char = '\u{feff}';

/// Reads UTF-8 text verbatim; markdown is kept as-is so headings survive
/// into the chunker
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    fn parser_type(&self) -> ParserType {
        ParserType::PlainText
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let text = input.utf8()?;
        let content = text.strip_prefix(UTF8_BOM).unwrap_or(text).replace("\r\n", "\n");

        Ok(ParsedDocument::new(content, DocumentMetadata::for_input(&input)))
    }
}
