//! OCR engine port

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Decoded raster image, 8-bit RGB, row-major, no padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap RGB samples; `pixels.len()` must equal `width * height * 3`
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DomainError> {
        let expected = Self::byte_len(width, height)?;

        if pixels.len() != expected {
            return Err(DomainError::extraction(format!(
                "RGB buffer for {}x{} image has {} bytes, expected {}",
                width,
                height,
                pixels.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Size of a `width x height` RGB buffer; fails when it does not fit in memory
    pub fn byte_len(width: u32, height: u32) -> Result<usize, DomainError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(|| {
                DomainError::extraction(format!("Image of {}x{} pixels is too large", width, height))
            })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// One recognised line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub score: f32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Text recognition over a single image
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OcrEngine: Send + Sync + Debug {
    /// Recognised lines in reading order; empty when the image holds no text
    async fn recognize(&self, image: &RasterImage) -> Result<Vec<OcrLine>, DomainError>;

    fn engine_name(&self) -> &'static str;
}
