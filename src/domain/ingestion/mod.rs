//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `DocumentParser` trait for parsing supported document formats
//! - `OcrEngine` port used to read text out of embedded images
//! - `Partitioner` trait and element types for typed text fragments
//! - `ChunkingStrategy` trait for splitting documents into chunks

pub mod chunker;
pub mod ocr;
pub mod parser;
pub mod parser_type;
pub mod partition;

pub use chunker::{Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy};
pub use ocr::{OcrEngine, OcrLine, RasterImage};
pub use parser::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
pub use parser_type::{detect_parser_from_filename, ParserType};
pub use partition::{
    Element, ElementCategory, LoadMode, ParagraphGrouping, PartitionOptions, Partitioner,
    DEFAULT_MAX_PARTITION,
};

#[cfg(test)]
pub use ocr::MockOcrEngine;
