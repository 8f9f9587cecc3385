//! Client for a RapidOCR API server

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};

use super::encode_png;
use crate::domain::ingestion::{OcrEngine, OcrLine, RasterImage};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

/// Posts each image, base64 PNG, to `{base_url}/ocr`
#[derive(Debug)]
pub struct RapidOcrHttpEngine<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> RapidOcrHttpEngine<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn ocr_url(&self) -> String {
        format!("{}/ocr", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> OcrEngine for RapidOcrHttpEngine<C> {
    async fn recognize(&self, image: &RasterImage) -> Result<Vec<OcrLine>, DomainError> {
        let encoded = STANDARD.encode(encode_png(image)?);

        let response = self
            .client
            .post_form(&self.ocr_url(), vec![], &[("image_data", encoded)])
            .await
            .map_err(|e| DomainError::ocr(format!("RapidOCR request failed: {}", e)))?;

        parse_response(response)
    }

    fn engine_name(&self) -> &'static str {
        "rapidocr"
    }
}

/// The server replies `{"0": {"rec_txt": .., "score": ..}, "1": ..}`; an
/// image without text yields `{}`
fn parse_response(response: serde_json::Value) -> Result<Vec<OcrLine>, DomainError> {
    let object = response
        .as_object()
        .ok_or_else(|| DomainError::ocr(format!("Unexpected RapidOCR response: {}", response)))?;

    let mut lines = Vec::with_capacity(object.len());

    for (key, entry) in object {
        let index: usize = key
            .parse()
            .map_err(|_| DomainError::ocr(format!("Unexpected RapidOCR line key: {}", key)))?;

        let text = entry
            .get("rec_txt")
            .and_then(|t| t.as_str())
            .ok_or_else(|| DomainError::ocr(format!("RapidOCR line {} has no rec_txt", key)))?;

        // Scores arrive as strings from some server versions
        let score = match entry.get("score") {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
            Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        };

        lines.push((index, OcrLine::new(text, score)));
    }

    lines.sort_by_key(|(index, _)| *index);

    Ok(lines.into_iter().map(|(_, line)| line).collect())
}
