//! Factory for selecting document parsers

use std::sync::Arc;

use crate::domain::ingestion::{detect_parser_from_filename, DocumentParser, ParserType};
use crate::domain::DomainError;

use super::parsers::{OcrPdfLoader, PlainTextParser};

/// Hands out the parser for a file. PDF support needs an OCR engine, so it
/// is only available once a loader has been registered.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    plain_text: Arc<dyn DocumentParser>,
    pdf: Option<Arc<dyn DocumentParser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    pub fn new() -> Self {
        Self {
            plain_text: Arc::new(PlainTextParser::new()),
            pdf: None,
        }
    }

    pub fn with_pdf_loader(mut self, loader: OcrPdfLoader) -> Self {
        self.pdf = Some(Arc::new(loader));
        self
    }

    /// Create a parser for the given type
    pub fn create(&self, parser_type: ParserType) -> Result<Arc<dyn DocumentParser>, DomainError> {
        match parser_type {
            ParserType::PlainText => Ok(Arc::clone(&self.plain_text)),
            ParserType::Pdf => self.pdf.clone().ok_or_else(|| {
                DomainError::configuration("PDF parsing requires an OCR engine")
            }),
        }
    }

    /// Parser chosen by the file's extension
    pub fn for_filename(&self, filename: &str) -> Result<Arc<dyn DocumentParser>, DomainError> {
        let parser_type = detect_parser_from_filename(filename).ok_or_else(|| {
            DomainError::validation(format!("Unsupported file type: {}", filename))
        })?;

        self.create(parser_type)
    }

    /// Extensions this factory can currently parse
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions = ParserType::PlainText.extensions().to_vec();

        if self.pdf.is_some() {
            extensions.extend_from_slice(ParserType::Pdf.extensions());
        }

        extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::MockOcrEngine;

    fn with_pdf() -> ParserFactory {
        ParserFactory::new().with_pdf_loader(OcrPdfLoader::new(Arc::new(MockOcrEngine::new())))
    }

    #[test]
    fn test_plain_text_by_filename() {
        let parser = ParserFactory::new().for_filename("notes.md").unwrap();
        assert!(parser.supports_file("notes.md"));
    }

    #[test]
    fn test_pdf_requires_loader() {
        let err = ParserFactory::new().create(ParserType::Pdf).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        let parser = with_pdf().for_filename("scan.pdf").unwrap();
        assert!(parser.supports_file("scan.pdf"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = with_pdf().for_filename("sheet.xlsx").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(!ParserFactory::new().supported_extensions().contains(&"pdf"));

        let extensions = with_pdf().supported_extensions();
        assert!(extensions.contains(&"txt"));
        assert!(extensions.contains(&"pdf"));
    }
}
