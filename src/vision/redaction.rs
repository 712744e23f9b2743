// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redaction compositing: opaque black boxes over detected regions

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use super::image_utils::{decode_image_bytes, encode_png, ImageError};
use crate::pii::{BoundingBox, Detection};

/// Fill colour for redacted regions
pub const REDACTION_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Integer rectangle guaranteed to lie inside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Round a box to whole pixels and clamp it into a `width` x `height` image
///
/// The origin is clamped to `[0, W-1] x [0, H-1]` and the extent to
/// `[1, W-left] x [1, H-top]`. `None` for an empty image.
pub fn clamp_rect(bbox: &BoundingBox, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let x = bbox.left.round().clamp(0.0, (width - 1) as f64) as u32;
    let y = bbox.top.round().clamp(0.0, (height - 1) as f64) as u32;
    let w = bbox.width.round().clamp(1.0, (width - x) as f64) as u32;
    let h = bbox.height.round().clamp(1.0, (height - y) as f64) as u32;
    Some(PixelRect {
        x,
        y,
        width: w.max(1),
        height: h.max(1),
    })
}

/// Paint every detection onto `canvas`; returns the number of boxes drawn
pub fn redact_image(canvas: &mut RgbaImage, detections: &[Detection]) -> usize {
    let (width, height) = canvas.dimensions();
    let mut drawn = 0;
    for det in detections {
        let Some(rect) = clamp_rect(&det.bbox, width, height) else {
            continue;
        };
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                canvas.put_pixel(x, y, REDACTION_FILL);
            }
        }
        drawn += 1;
    }
    drawn
}

/// Redact an already decoded image and encode the result as PNG
pub fn redact_decoded(image: &DynamicImage, detections: &[Detection]) -> Result<Vec<u8>, ImageError> {
    let mut canvas = image.to_rgba8();
    let drawn = redact_image(&mut canvas, detections);
    debug!(
        "Redacted {} regions on {}x{} image",
        drawn,
        canvas.width(),
        canvas.height()
    );
    encode_png(&DynamicImage::ImageRgba8(canvas))
}

/// Decode `original`, paint the detections, and re-encode as PNG
///
/// Detection boxes must already be in `original`'s coordinate space. With no
/// detections the image is still re-encoded.
pub fn redact(original: &[u8], detections: &[Detection]) -> Result<Vec<u8>, ImageError> {
    let (image, _) = decode_image_bytes(original)?;
    redact_decoded(&image, detections)
}
