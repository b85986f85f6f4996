//! Upload helpers shared by the image and avatar flows.

use rg_core::{AppError, Result};

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Edge length of the stored thumbnails.
pub const THUMBNAIL_SIZE: u32 = 250;

/// Rejects empty, oversized, or non-image payloads before they reach the CDN.
pub fn ensure_image(data: &[u8]) -> Result<image::ImageFormat> {
    if data.is_empty() {
        return Err(AppError::validation("uploaded file is empty"));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::validation(format!(
            "uploaded file exceeds {MAX_UPLOAD_BYTES} bytes"
        )));
    }
    image::guess_format(data).map_err(|_| AppError::validation("uploaded file is not an image"))
}

/// File stem usable as a CDN asset name: `"My Cat.v2.jpg"` -> `"My_Cat"`.
pub fn public_stem(file_name: &str) -> String {
    let stem: String = file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "image".to_string()
    } else {
        stem
    }
}
