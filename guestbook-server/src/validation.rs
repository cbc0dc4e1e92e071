//! Upload validation module
//!
//! Uploads arrive as `data:image/...;base64,` URLs. The decoded image must be
//! within the configured byte and dimension limits: clients compress before
//! uploading and the server refuses anything that was not.

use std::io::Cursor;

use guestbook_core::compress::parse_data_url;
use guestbook_core::entry::display_name;
use guestbook_core::VisitorId;
use image::ImageReader;

use crate::error::ApiError;

/// A decoded, validated upload.
#[derive(Debug)]
pub struct ValidatedImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Reject blank visitor ids.
pub fn validate_visitor_id(visitor_id: &VisitorId) -> Result<(), ApiError> {
    if visitor_id.as_str().trim().is_empty() {
        return Err(ApiError::bad_request("Missing visitor id"));
    }
    Ok(())
}

/// Trim the name, substitute the default when blank and cap its length.
pub fn normalize_name(name: &str, max_chars: usize) -> String {
    display_name(name).chars().take(max_chars.max(1)).collect()
}

/// Decode a data URL and check it against the size and dimension limits.
///
/// The MIME type is sniffed from the bytes; the one declared in the URL
/// only has to be an image type.
pub fn validate_image(
    data_url: &str,
    max_bytes: usize,
    max_dimension: u32,
) -> Result<ValidatedImage, ApiError> {
    if data_url.trim().is_empty() {
        return Err(ApiError::bad_request("No image provided"));
    }

    let (declared, bytes) =
        parse_data_url(data_url).map_err(|e| ApiError::bad_request(e.to_string()))?;
    if !declared.starts_with("image/") {
        return Err(ApiError::bad_request(format!(
            "Unsupported image type: '{declared}'"
        )));
    }

    if bytes.len() > max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "Image too large: {} KB exceeds maximum of {} KB",
            bytes.len() / 1024,
            max_bytes / 1024
        )));
    }

    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::bad_request(format!("Unreadable image: {e}")))?;
    let mime = reader
        .format()
        .map(|f| f.to_mime_type())
        .ok_or_else(|| ApiError::bad_request("Unrecognized image format"))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ApiError::bad_request(format!("Unreadable image: {e}")))?;

    if width.max(height) > max_dimension {
        return Err(ApiError::bad_request(format!(
            "Image is {width}x{height}; the longer side must not exceed {max_dimension}px"
        )));
    }

    Ok(ValidatedImage {
        mime,
        bytes,
        width,
        height,
    })
}
