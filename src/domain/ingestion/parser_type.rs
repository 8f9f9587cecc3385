//! Parser selection by file extension

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of document parser to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParserType {
    /// Plain text and markdown, read verbatim
    PlainText,
    /// PDF, native text plus OCR of embedded images
    Pdf,
}

impl ParserType {
    /// File extensions associated with this parser type
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::PlainText => &["txt", "text", "md", "markdown"],
            Self::Pdf => &["pdf"],
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText => write!(f, "plain_text"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

/// Detect parser type from filename extension
pub fn detect_parser_from_filename(filename: &str) -> Option<ParserType> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();

    [ParserType::PlainText, ParserType::Pdf]
        .into_iter()
        .find(|parser_type| parser_type.extensions().contains(&ext.as_str()))
}
