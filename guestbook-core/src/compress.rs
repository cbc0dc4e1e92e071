//! Upload compression.
//!
//! Every captured image is decoded, scaled so that its longer side does not
//! exceed a fixed maximum (aspect ratio preserved), and re-encoded as JPEG at
//! a fixed lossy quality before it may be uploaded. Unbounded uploads are not
//! possible through this crate.
//!
//! ```no_run
//! use guestbook_core::compress::ImageCompressor;
//!
//! let raw = std::fs::read("capture.png").unwrap();
//! let compressed = ImageCompressor::default().compress(&raw).unwrap();
//! assert!(compressed.width.max(compressed.height) <= 800);
//! let body = compressed.to_data_url();
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::CompressionError;

/// Longer side, in pixels, of every uploaded image.
pub const MAX_DIMENSION: u32 = 800;

/// JPEG quality (0-100) used for uploads.
pub const JPEG_QUALITY: u8 = 70;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Compression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            quality: JPEG_QUALITY,
        }
    }
}

/// A JPEG ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl CompressedImage {
    /// `data:image/jpeg;base64,...`, the form the create endpoint expects.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.jpeg))
    }
}

/// Target size for an image of `width` x `height`.
///
/// Images already within `max_dimension` keep their size. Otherwise the
/// longer side becomes `max_dimension` and the shorter side is scaled by the
/// same factor, rounded to the nearest pixel and never below 1.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width.max(height) <= max_dimension || width == 0 || height == 0 {
        return (width, height);
    }

    let scale = |side: u32, longer: u32| -> u32 {
        let scaled = (u64::from(side) * u64::from(max_dimension) + u64::from(longer) / 2)
            / u64::from(longer);
        (scaled as u32).max(1)
    };

    if width >= height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

/// Compressor configured with [`CompressionSettings`].
#[derive(Debug, Clone, Default)]
pub struct ImageCompressor {
    settings: CompressionSettings,
}

impl ImageCompressor {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> CompressionSettings {
        self.settings
    }

    /// Decode raw image bytes (JPEG, PNG, GIF or WebP) and compress them.
    pub fn compress(&self, data: &[u8]) -> Result<CompressedImage, CompressionError> {
        let image = image::load_from_memory(data)
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        self.compress_image(&image)
    }

    /// Compress an already decoded image.
    pub fn compress_image(&self, image: &DynamicImage) -> Result<CompressedImage, CompressionError> {
        let (src_width, src_height) = image.dimensions();
        let (width, height) =
            scaled_dimensions(src_width, src_height, self.settings.max_dimension);

        let rgb = if (width, height) == (src_width, src_height) {
            image.to_rgb8()
        } else {
            image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        };

        let mut jpeg = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.settings.quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| CompressionError::Encode(e.to_string()))?;
        }

        tracing::debug!(
            src_width,
            src_height,
            width,
            height,
            bytes = jpeg.len(),
            "Compressed image"
        );

        Ok(CompressedImage {
            width: rgb.width(),
            height: rgb.height(),
            jpeg,
        })
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), CompressionError> {
    let rest = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| CompressionError::Decode("not a data URL".into()))?;
    let (mime, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| CompressionError::Decode("data URL is not base64-encoded".into()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| CompressionError::Decode(format!("invalid base64 payload: {e}")))?;
    Ok((mime.to_ascii_lowercase(), bytes))
}
