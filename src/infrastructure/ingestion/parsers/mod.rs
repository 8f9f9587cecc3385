//! Document parser implementations

mod ocr_pdf;
mod pdf_reader;
mod plain_text;

pub use ocr_pdf::OcrPdfLoader;
pub use pdf_reader::{LopdfReader, PdfPage, PdfReader};
pub use plain_text::PlainTextParser;
