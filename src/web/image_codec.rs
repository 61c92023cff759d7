// Image decode/encode helpers for the remove-bg endpoint.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use super::error::ApiError;

/// Decodes the uploaded bytes and normalizes the result to RGBA.
///
/// A declared content type is used as a format hint only; anything else goes
/// through format auto-detection. Decoding up front means an invalid upload
/// fails with a diagnostic before the model session is ever touched.
pub fn decode_input_image(
    file_data: &[u8],
    content_type_str: Option<&str>,
) -> Result<DynamicImage, ApiError> {
    let media_type = content_type_str.map(|s| s[0..s.find(';').unwrap_or(s.len())].trim());

    let img_format_hint = match media_type {
        Some("image/jpeg") => Some(ImageFormat::Jpeg),
        Some("image/png") => Some(ImageFormat::Png),
        Some("image/webp") => Some(ImageFormat::WebP),
        _ => None,
    };

    // The declared type is a hint, not an allow-list: a mislabeled but
    // valid image must still decode, so a failed hinted decode falls back
    // to format sniffing.
    let decoded = if let Some(format) = img_format_hint {
        image::load_from_memory_with_format(file_data, format)
            .or_else(|_| image::load_from_memory(file_data))
    } else {
        image::load_from_memory(file_data)
    };
    let dyn_img = decoded
        .map_err(|e| ApiError::UndecodableImage(format!("Failed to decode image: {}", e)))?;

    Ok(DynamicImage::ImageRgba8(dyn_img.to_rgba8()))
}

/// Encodes the RGBA cutout as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut buffer,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        ImageFormat::Png,
    )
    .map_err(|e| ApiError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(buffer.into_inner())
}
