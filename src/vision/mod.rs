// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image handling around PII detection
//!
//! This module provides:
//! - Upload validation, decoding and PNG encoding
//! - OCR preprocessing and the OCR engine abstraction (tesseract-backed)
//! - Redaction compositing onto the original image

pub mod image_utils;
pub mod ocr;
pub mod redaction;

pub use image_utils::{
    decode_base64_payload, decode_image_bytes, detect_format, encode_png, validate_upload,
    ImageError, ImageInfo, ALLOWED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use ocr::{OcrEngine, OcrError, OcrSession, OcrWorker};
pub use redaction::{clamp_rect, redact, redact_decoded, redact_image, PixelRect};
