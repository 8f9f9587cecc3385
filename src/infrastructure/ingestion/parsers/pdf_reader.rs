//! PDF page access: native text plus the raster images each page draws

use std::fmt::Debug;
use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::domain::ingestion::RasterImage;
use crate::domain::DomainError;

/// Parent chains and nested form XObjects deeper than this are ignored
const MAX_NESTING: usize = 16;

/// One page of a PDF, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// 1-based page number
    pub number: u32,
    pub text: String,
    pub images: Vec<RasterImage>,
}

/// Synchronous PDF access; callers run it on a blocking thread
pub trait PdfReader: Send + Sync + Debug {
    fn read_pages(&self, bytes: &[u8]) -> Result<Vec<PdfPage>, DomainError>;
}

/// [`PdfReader`] backed by `lopdf`. Images are the image XObjects reachable
/// from the page resources, including those inside form XObjects; inline
/// images are not collected.
#[derive(Debug, Clone, Default)]
pub struct LopdfReader;

impl LopdfReader {
    pub fn new() -> Self {
        Self
    }
}

impl PdfReader for LopdfReader {
    fn read_pages(&self, bytes: &[u8]) -> Result<Vec<PdfPage>, DomainError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| DomainError::extraction(format!("Failed to parse PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(DomainError::extraction("Encrypted PDFs are not supported"));
        }

        let mut pages = Vec::new();

        for (number, page_id) in doc.get_pages() {
            let text = doc.extract_text(&[number]).map_err(|e| {
                DomainError::extraction(format!(
                    "Failed to extract text from page {}: {}",
                    number, e
                ))
            })?;

            let images = page_images(&doc, page_id)?;

            tracing::debug!(page = number, images = images.len(), "Read PDF page");

            pages.push(PdfPage {
                number,
                text,
                images,
            });
        }

        Ok(pages)
    }
}

fn pdf_err(context: &str, err: lopdf::Error) -> DomainError {
    DomainError::extraction(format!("{}: {}", context, err))
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, DomainError> {
    doc.dereference(object)
        .map(|(_, resolved)| resolved)
        .map_err(|e| pdf_err("Broken object reference", e))
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Dictionary, DomainError> {
    resolve(doc, object)?
        .as_dict()
        .map_err(|e| pdf_err("Expected a dictionary", e))
}

fn page_images(doc: &Document, page_id: lopdf::ObjectId) -> Result<Vec<RasterImage>, DomainError> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| pdf_err("Invalid page object", e))?;

    let mut images = Vec::new();

    if let Some(resources) = inherited_resources(doc, page)? {
        collect_images(doc, resources, 0, &mut images)?;
    }

    Ok(images)
}

/// Resources of a page, walking up the page tree when the page inherits them
fn inherited_resources<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
) -> Result<Option<&'a Dictionary>, DomainError> {
    let mut node = page;

    for _ in 0..MAX_NESTING {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources).map(Some);
        }

        match node.get(b"Parent") {
            Ok(parent) => node = resolve_dict(doc, parent)?,
            Err(_) => return Ok(None),
        }
    }

    Ok(None)
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    depth: usize,
    out: &mut Vec<RasterImage>,
) -> Result<(), DomainError> {
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(());
    };

    for (_, entry) in resolve_dict(doc, xobjects)?.iter() {
        let Ok(stream) = resolve(doc, entry)?.as_stream() else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => out.push(decode_image(doc, stream)?),
            Ok(b"Form") if depth < MAX_NESTING => {
                if let Ok(form_resources) = stream.dict.get(b"Resources") {
                    collect_images(doc, resolve_dict(doc, form_resources)?, depth + 1, out)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

fn int_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Result<Option<i64>, DomainError> {
    match dict.get(key) {
        Ok(value) => resolve(doc, value)?
            .as_i64()
            .map(Some)
            .map_err(|e| pdf_err(&format!("/{} is not an integer", String::from_utf8_lossy(key)), e)),
        Err(_) => Ok(None),
    }
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Result<Vec<Vec<u8>>, DomainError> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };

    match resolve(doc, filter)? {
        Object::Name(name) => Ok(vec![name.clone()]),
        Object::Array(items) => items
            .iter()
            .map(|item| match resolve(doc, item)? {
                Object::Name(name) => Ok(name.clone()),
                other => Err(DomainError::extraction(format!(
                    "Unexpected filter entry: {:?}",
                    other
                ))),
            })
            .collect(),
        other => Err(DomainError::extraction(format!(
            "Unexpected /Filter value: {:?}",
            other
        ))),
    }
}

fn color_model(doc: &Document, dict: &Dictionary) -> Result<ColorModel, DomainError> {
    let color_space = match dict.get(b"ColorSpace") {
        Ok(cs) => resolve(doc, cs)?,
        Err(_) => {
            let is_mask = dict
                .get(b"ImageMask")
                .and_then(Object::as_bool)
                .unwrap_or(false);

            return if is_mask {
                Ok(ColorModel::Gray)
            } else {
                Err(DomainError::extraction("Image has no /ColorSpace"))
            };
        }
    };

    match color_space {
        Object::Name(name) => named_color_model(name),
        Object::Array(items) => {
            let family = items
                .first()
                .map(|f| resolve(doc, f))
                .transpose()?
                .and_then(|f| f.as_name().ok())
                .ok_or_else(|| DomainError::extraction("Empty /ColorSpace array"))?;

            if family != b"ICCBased" {
                return named_color_model(family);
            }

            let profile = items
                .get(1)
                .map(|p| resolve(doc, p))
                .transpose()?
                .and_then(|p| p.as_stream().ok())
                .ok_or_else(|| DomainError::extraction("ICCBased colour space without profile"))?;

            match int_entry(doc, &profile.dict, b"N")? {
                Some(1) => Ok(ColorModel::Gray),
                Some(3) => Ok(ColorModel::Rgb),
                Some(4) => Ok(ColorModel::Cmyk),
                other => Err(DomainError::extraction(format!(
                    "Unsupported ICCBased component count: {:?}",
                    other
                ))),
            }
        }
        other => Err(DomainError::extraction(format!(
            "Unexpected /ColorSpace value: {:?}",
            other
        ))),
    }
}

fn named_color_model(name: &[u8]) -> Result<ColorModel, DomainError> {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
        b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
        other => Err(DomainError::extraction(format!(
            "Unsupported colour space: {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn decode_image(doc: &Document, stream: &Stream) -> Result<RasterImage, DomainError> {
    let dict = &stream.dict;
    let filters = filter_names(doc, dict)?;

    if filters.iter().any(|f| f.as_slice() == b"DCTDecode") {
        return decode_jpeg(stream, &filters);
    }

    let width = dimension(doc, dict, b"Width")?;
    let height = dimension(doc, dict, b"Height")?;
    let bits = int_entry(doc, dict, b"BitsPerComponent")?.unwrap_or(8);
    let model = color_model(doc, dict)?;

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [flate] if flate.as_slice() == b"FlateDecode" => {
            let inflated = inflate(&stream.content)?;
            match decode_parms(doc, dict)? {
                Some(parms) => unpredict(doc, parms, inflated)?,
                None => inflated,
            }
        }
        other => {
            let names: Vec<String> = other
                .iter()
                .map(|f| String::from_utf8_lossy(f).into_owned())
                .collect();
            return Err(DomainError::extraction(format!(
                "Unsupported image filter chain: {}",
                names.join(", ")
            )));
        }
    };

    let pixels = to_rgb(&samples, width, height, model, bits)?;
    RasterImage::new(width, height, pixels)
}

fn dimension(doc: &Document, dict: &Dictionary, key: &[u8]) -> Result<u32, DomainError> {
    let value = int_entry(doc, dict, key)?.ok_or_else(|| {
        DomainError::extraction(format!("Image has no /{}", String::from_utf8_lossy(key)))
    })?;

    u32::try_from(value)
        .map_err(|_| DomainError::extraction(format!("Invalid image dimension: {}", value)))
}

fn decode_jpeg(stream: &Stream, filters: &[Vec<u8>]) -> Result<RasterImage, DomainError> {
    let data = match filters {
        [dct] if dct.as_slice() == b"DCTDecode" => stream.content.clone(),
        [flate, dct] if flate.as_slice() == b"FlateDecode" && dct.as_slice() == b"DCTDecode" => {
            inflate(&stream.content)?
        }
        _ => {
            return Err(DomainError::extraction(
                "DCTDecode must be the last filter of an image",
            ))
        }
    };

    let decoded = image::load_from_memory_with_format(&data, image::ImageFormat::Jpeg)
        .map_err(|e| DomainError::extraction(format!("Failed to decode JPEG image: {}", e)))?
        .to_rgb8();

    let (width, height) = decoded.dimensions();
    RasterImage::new(width, height, decoded.into_raw())
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, DomainError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| DomainError::extraction(format!("FlateDecode failed: {}", e)))?;
    Ok(out)
}

fn decode_parms<'a>(doc: &'a Document, dict: &'a Dictionary) -> Result<Option<&'a Dictionary>, DomainError> {
    let Ok(parms) = dict.get(b"DecodeParms") else {
        return Ok(None);
    };

    match resolve(doc, parms)? {
        Object::Dictionary(d) => Ok(Some(d)),
        Object::Array(items) => match items.first() {
            Some(first) => match resolve(doc, first)? {
                Object::Dictionary(d) => Ok(Some(d)),
                _ => Ok(None),
            },
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

fn unpredict(doc: &Document, parms: &Dictionary, data: Vec<u8>) -> Result<Vec<u8>, DomainError> {
    let predictor = int_entry(doc, parms, b"Predictor")?.unwrap_or(1);

    match predictor {
        1 => Ok(data),
        10..=15 => {
            let colors = int_entry(doc, parms, b"Colors")?.unwrap_or(1).max(1) as usize;
            let bits = int_entry(doc, parms, b"BitsPerComponent")?.unwrap_or(8).max(1) as usize;
            let columns = int_entry(doc, parms, b"Columns")?.unwrap_or(1).max(1) as usize;
            png_unpredict(&data, colors, bits, columns)
        }
        other => Err(DomainError::extraction(format!(
            "Unsupported predictor: {}",
            other
        ))),
    }
}

fn checked_product(factors: &[usize]) -> Result<usize, DomainError> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| DomainError::extraction(format!("Image size overflows: {:?}", factors)))
}

/// Undo per-row PNG filtering (None, Sub, Up, Average, Paeth)
fn png_unpredict(
    data: &[u8],
    colors: usize,
    bits: usize,
    columns: usize,
) -> Result<Vec<u8>, DomainError> {
    let bpp = checked_product(&[colors, bits])?.div_ceil(8).max(1);
    let row_len = checked_product(&[columns, colors, bits])?.div_ceil(8);
    let stride = row_len + 1;

    let mut out = Vec::with_capacity(data.len() / stride * row_len);
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks_exact(stride) {
        let filter = chunk[0];
        let mut row = chunk[1..].to_vec();

        for i in 0..row_len {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };

            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(DomainError::extraction(format!(
                        "Invalid PNG row filter: {}",
                        other
                    )))
                }
            };

            row[i] = row[i].wrapping_add(predicted);
        }

        out.extend_from_slice(&row);
        prev = row;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Expand samples to `width * height * 3` RGB bytes
fn to_rgb(
    samples: &[u8],
    width: u32,
    height: u32,
    model: ColorModel,
    bits: i64,
) -> Result<Vec<u8>, DomainError> {
    let (w, h) = (width as usize, height as usize);

    let components = match model {
        ColorModel::Gray => 1,
        ColorModel::Rgb => 3,
        ColorModel::Cmyk => 4,
    };

    let rgb_len = RasterImage::byte_len(width, height)?;
    let required = match (model, bits) {
        (ColorModel::Gray, 1) => checked_product(&[w.div_ceil(8), h])?,
        (_, 8) => checked_product(&[w, h, components])?,
        (_, other) => {
            return Err(DomainError::extraction(format!(
                "Unsupported image depth: {} bits per component with {} components",
                other, components
            )))
        }
    };

    if samples.len() < required {
        return Err(DomainError::extraction(format!(
            "Image data too short: {} bytes, expected {}",
            samples.len(),
            required
        )));
    }

    let samples = &samples[..required];
    let mut rgb = Vec::with_capacity(rgb_len);

    match (model, bits) {
        (ColorModel::Gray, 1) => {
            let row_bytes = w.div_ceil(8);
            for y in 0..h {
                for x in 0..w {
                    let byte = samples[y * row_bytes + x / 8];
                    let value = if (byte >> (7 - x % 8)) & 1 == 1 { 255 } else { 0 };
                    rgb.extend_from_slice(&[value, value, value]);
                }
            }
        }
        (ColorModel::Gray, _) => {
            for &value in samples {
                rgb.extend_from_slice(&[value, value, value]);
            }
        }
        (ColorModel::Rgb, _) => rgb.extend_from_slice(samples),
        (ColorModel::Cmyk, _) => {
            for px in samples.chunks_exact(4) {
                let k = 255 - px[3] as u16;
                for &c in &px[..3] {
                    rgb.push(((255 - c as u16) * k / 255) as u8);
                }
            }
        }
    }

    Ok(rgb)
}
