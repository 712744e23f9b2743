// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading, validation and encoding helpers

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use thiserror::Error;

/// Default maximum upload size (5MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted width or height of a decoded upload
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Largest accepted pixel count of a decoded upload
pub const MAX_IMAGE_PIXELS: u64 = 40_000_000;

/// Allocation ceiling handed to the decoder
pub const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// MIME types accepted for uploads
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("Image dimensions {width}x{height} exceed the limit ({reason})")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Check an upload against the size limit and MIME allow-list
///
/// `mime` is the type declared by the client, if any. The declared type must
/// be on the allow-list; the bytes themselves must also sniff as a supported
/// format. Returns the sniffed format.
pub fn validate_upload(
    bytes: &[u8],
    mime: Option<&str>,
    max_bytes: usize,
) -> Result<ImageFormat, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }

    if let Some(mime) = mime {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or(mime)
            .trim()
            .to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
            return Err(ImageError::UnsupportedMimeType(mime.to_string()));
        }
    }

    match detect_format(bytes)? {
        format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP) => {
            Ok(format)
        }
        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Split a `data:<mime>;base64,<payload>` URL
///
/// Plain base64 (no `data:` prefix) is returned unchanged with no MIME type.
pub fn split_data_url(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, trimmed);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, rest),
    }
}

/// Decode base64 image data, with or without a data-URL prefix
pub fn decode_base64_payload(input: &str) -> Result<Vec<u8>, ImageError> {
    let (_, payload) = split_data_url(input);
    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }
    Ok(STANDARD.decode(payload)?)
}

/// Decode raw image bytes
///
/// Size and MIME checks are the caller's job (see [`validate_upload`]).
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Detect format from magic bytes
    let format = detect_format(bytes)?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    check_dimensions(width, height)?;

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(decode_limits());
    let img = reader.decode().map_err(|e| match e {
        image::ImageError::Limits(limit) => ImageError::DimensionsTooLarge {
            width,
            height,
            reason: limit.to_string(),
        },
        other => ImageError::DecodeFailed(other.to_string()),
    })?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Reject images whose sides or pixel count exceed the decode limits
pub fn check_dimensions(width: u32, height: u32) -> Result<(), ImageError> {
    let reason = if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        format!("max {} px per side", MAX_IMAGE_DIMENSION)
    } else if u64::from(width) * u64::from(height) > MAX_IMAGE_PIXELS {
        format!("max {} pixels", MAX_IMAGE_PIXELS)
    } else {
        return Ok(());
    };
    Err(ImageError::DimensionsTooLarge {
        width,
        height,
        reason,
    })
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// MIME type for a detected format
pub fn format_to_mime(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Encode an image as PNG
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(out.into_inner())
}

/// Render bytes as a `data:<mime>;base64,...` URL
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
