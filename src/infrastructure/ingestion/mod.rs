//! Document ingestion infrastructure
//!
//! Parsers turn files into text, the partitioner splits PDF text into typed
//! elements and the recursive chunker cuts documents down to embedding size.

pub mod chunkers;
pub mod factory;
pub mod parsers;
pub mod partition;

pub use chunkers::RecursiveChunker;
pub use factory::ParserFactory;
pub use parsers::{LopdfReader, OcrPdfLoader, PdfPage, PdfReader, PlainTextParser};
pub use partition::TextPartitioner;
