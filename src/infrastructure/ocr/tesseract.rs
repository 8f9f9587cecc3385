//! Tesseract command-line OCR engine

use async_trait::async_trait;
use tokio::process::Command;

use super::encode_png;
use crate::domain::ingestion::{OcrEngine, OcrLine, RasterImage};
use crate::domain::DomainError;

/// Runs the `tesseract` binary once per image, reading word boxes from its
/// TSV output and regrouping them into lines
#[derive(Debug, Clone)]
pub struct TesseractOcrEngine {
    command: String,
    language: String,
}

impl TesseractOcrEngine {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }
}

impl Default for TesseractOcrEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcrEngine {
    async fn recognize(&self, image: &RasterImage) -> Result<Vec<OcrLine>, DomainError> {
        let png = encode_png(image)?;

        let file = tempfile::Builder::new()
            .prefix("rag-kb-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| DomainError::ocr(format!("Failed to create temp file: {}", e)))?;

        tokio::fs::write(file.path(), &png)
            .await
            .map_err(|e| DomainError::ocr(format!("Failed to write temp image: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .await
            .map_err(|e| DomainError::ocr(format!("Failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            return Err(DomainError::ocr(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let lines = parse_tsv(&String::from_utf8_lossy(&output.stdout));

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            lines = lines.len(),
            "Tesseract recognised image"
        );

        Ok(lines)
    }

    fn engine_name(&self) -> &'static str {
        "tesseract"
    }
}

/// Word rows (level 5) grouped by page/block/paragraph/line, confidence averaged into `[0, 1]`
fn parse_tsv(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<String>, Vec<f32>)> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        let conf = cols[10].parse::<f32>().unwrap_or(0.0).max(0.0) / 100.0;

        match lines.last_mut() {
            Some((last_key, words, confs)) if *last_key == key => {
                words.push(text.to_string());
                confs.push(conf);
            }
            _ => lines.push((key, vec![text.to_string()], vec![conf])),
        }
    }

    lines
        .into_iter()
        .map(|(_, words, confs)| {
            let score = confs.iter().sum::<f32>() / confs.len() as f32;
            OcrLine::new(words.join(" "), score)
        })
        .collect()
}
