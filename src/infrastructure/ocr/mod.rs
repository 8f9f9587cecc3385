//! OCR engine implementations

mod rapidocr;
mod tesseract;

pub use rapidocr::RapidOcrHttpEngine;
pub use tesseract::TesseractOcrEngine;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::domain::ingestion::RasterImage;
use crate::domain::DomainError;

/// Encode an RGB raster as PNG, the interchange format both engines accept
pub(crate) fn encode_png(image: &RasterImage) -> Result<Vec<u8>, DomainError> {
    let mut buffer = Vec::new();

    PngEncoder::new(&mut buffer)
        .write_image(
            image.pixels(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| DomainError::ocr(format!("Failed to encode image as PNG: {}", e)))?;

    Ok(buffer)
}
