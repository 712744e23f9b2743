// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing ahead of OCR
//!
//! Steps:
//! 1. Resize to a fixed working width, preserving aspect ratio (upscaling allowed)
//! 2. Convert to grayscale
//! 3. Stretch contrast linearly over the full luma range
//! 4. Sharpen with an unsharp mask
//! 5. Encode as PNG for the OCR engine

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage};

use crate::pii::ImageSize;
use crate::vision::image_utils::{encode_png, ImageError};

/// Working width handed to the OCR engine
pub const DEFAULT_TARGET_WIDTH: u32 = 2000;

/// Largest pixel count the resized OCR image may have
pub const MAX_PROCESSED_PIXELS: u64 = 2000 * 10_000;

/// Gaussian sigma for the unsharp mask
pub const SHARPEN_SIGMA: f32 = 1.0;

/// Minimum luma difference the unsharp mask acts on
pub const SHARPEN_THRESHOLD: i32 = 0;

/// OCR-ready image plus the dimensions needed to map results back
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// PNG bytes fed to the OCR engine
    pub png: Vec<u8>,
    /// Size of the decoded upload
    pub original_size: ImageSize,
    /// Size of `png`
    pub processed_size: ImageSize,
}

/// Output dimensions for a resize to `target_width`, keeping aspect ratio
pub fn target_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let target_width = target_width.max(1);
    if width == 0 || height == 0 {
        return (target_width, 1);
    }
    let scale = target_width as f64 / width as f64;
    let target_height = (height as f64 * scale).round().max(1.0) as u32;
    (target_width, target_height)
}

/// Map the darkest pixel to 0 and the brightest to 255
///
/// Flat images are left untouched.
pub fn stretch_contrast(image: &mut GrayImage) {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if max <= min {
        return;
    }
    let range = (max - min) as u32;
    for pixel in image.pixels_mut() {
        pixel[0] = ((pixel[0] - min) as u32 * 255 / range) as u8;
    }
}

/// Prepare a decoded image for OCR
pub fn preprocess_image(
    image: &DynamicImage,
    target_width: u32,
) -> Result<PreprocessedImage, ImageError> {
    let (orig_w, orig_h) = image.dimensions();
    let (new_w, new_h) = target_dimensions(orig_w, orig_h, target_width);
    if u64::from(new_w) * u64::from(new_h) > MAX_PROCESSED_PIXELS {
        return Err(ImageError::DimensionsTooLarge {
            width: orig_w,
            height: orig_h,
            reason: format!(
                "{}x{} after resizing to width {}, max {} pixels",
                new_w, new_h, target_width, MAX_PROCESSED_PIXELS
            ),
        });
    }

    let resized = image.resize_exact(new_w, new_h, FilterType::Lanczos3);
    let mut gray = resized.to_luma8();
    stretch_contrast(&mut gray);
    let sharpened = imageops::unsharpen(&gray, SHARPEN_SIGMA, SHARPEN_THRESHOLD);

    let png = encode_png(&DynamicImage::ImageLuma8(sharpened))?;

    Ok(PreprocessedImage {
        png,
        original_size: ImageSize::new(orig_w, orig_h),
        processed_size: ImageSize::new(new_w, new_h),
    })
}
