//! PDF loader combining native text extraction with OCR of embedded images

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::pdf_reader::{LopdfReader, PdfReader};
use crate::domain::ingestion::{
    DocumentMetadata, DocumentParser, Element, LoadMode, OcrEngine, ParsedDocument, ParserInput,
    ParserType, PartitionOptions, Partitioner,
};
use crate::domain::knowledge_base::Document;
use crate::domain::DomainError;
use crate::infrastructure::ingestion::partition::TextPartitioner;

/// Loads a PDF into documents.
///
/// Every page contributes its native text followed by a newline, then the OCR
/// output of each image drawn on the page, one line per recognised line. The
/// resulting text is partitioned into elements and turned into documents
/// according to the configured [`LoadMode`].
#[derive(Debug, Clone)]
pub struct OcrPdfLoader {
    reader: Arc<dyn PdfReader>,
    ocr: Arc<dyn OcrEngine>,
    partitioner: Arc<dyn Partitioner>,
    options: PartitionOptions,
}

struct Extracted {
    text: String,
    pages: usize,
}

impl OcrPdfLoader {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            reader: Arc::new(LopdfReader::new()),
            ocr,
            partitioner: Arc::new(TextPartitioner::new()),
            options: PartitionOptions::default(),
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn PdfReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_options(mut self, options: PartitionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PartitionOptions {
        &self.options
    }

    /// Native text and OCR output of every page, as one blob
    pub async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, DomainError> {
        Ok(self.extract(bytes).await?.text)
    }

    /// Extracted text split into classified elements
    pub async fn partition(&self, bytes: Vec<u8>) -> Result<Vec<Element>, DomainError> {
        let text = self.extract_text(bytes).await?;
        Ok(self.partitioner.partition(&text, &self.options))
    }

    /// Load the PDF at `path`; documents carry the path as their source
    pub async fn load(&self, path: &Path) -> Result<Vec<Document>, DomainError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DomainError::extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.load_bytes(bytes, &path.to_string_lossy()).await
    }

    pub async fn load_bytes(
        &self,
        bytes: Vec<u8>,
        source: &str,
    ) -> Result<Vec<Document>, DomainError> {
        let elements = self.partition(bytes).await?;
        Ok(elements_to_documents(elements, self.options.mode, source))
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<Extracted, DomainError> {
        let reader = Arc::clone(&self.reader);
        let pages = tokio::task::spawn_blocking(move || reader.read_pages(&bytes))
            .await
            .map_err(|e| DomainError::internal(format!("PDF reader task failed: {}", e)))??;

        let image_count: usize = pages.iter().map(|p| p.images.len()).sum();
        tracing::info!(pages = pages.len(), images = image_count, "Extracting PDF text");

        let mut text = String::new();

        for page in &pages {
            text.push_str(&page.text);
            text.push('\n');

            for image in &page.images {
                if image.pixels().is_empty() {
                    continue;
                }

                let lines = self.ocr.recognize(image).await?;
                let recognised = lines
                    .iter()
                    .map(|line| line.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");

                // Newline-terminated: the next image or page starts on its own line
                if !recognised.is_empty() {
                    text.push_str(&recognised);
                    text.push('\n');
                }
            }
        }

        Ok(Extracted {
            text,
            pages: pages.len(),
        })
    }
}

fn elements_to_documents(elements: Vec<Element>, mode: LoadMode, source: &str) -> Vec<Document> {
    match mode {
        LoadMode::Single => {
            let content = elements
                .iter()
                .map(|e| e.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            vec![Document::new(content).with_source(source)]
        }
        LoadMode::Elements => elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                Document::new(element.text)
                    .with_source(source)
                    .with_metadata("category", serde_json::json!(element.category.as_str()))
                    .with_metadata("element_index", serde_json::json!(index))
            })
            .collect(),
    }
}

#[async_trait]
impl DocumentParser for OcrPdfLoader {
    fn parser_type(&self) -> ParserType {
        ParserType::Pdf
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let metadata = DocumentMetadata::for_input(&input);
        let extracted = self.extract(input.bytes).await?;

        let content = self
            .partitioner
            .partition(&extracted.text, &self.options)
            .into_iter()
            .map(|e| e.text)
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ParsedDocument::new(
            content,
            metadata.with_page_count(extracted.pages),
        ))
    }
}
