// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Redaction compositor tests
//!
//! Covers the pixel-level guarantees of the compositor:
//! - re-applying the same detections changes nothing
//! - boxes partly outside the image are clipped to it
//! - an empty detection list still yields a PNG with the source pixels

use fabstir_pii_redactor::pii::{BoundingBox, Detection, DetectionType};
use fabstir_pii_redactor::vision::{
    clamp_rect, decode_image_bytes, detect_format, encode_png, redact, redact_image,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use proptest::prelude::*;
use uuid::Uuid;

fn detection(bbox: BoundingBox) -> Detection {
    Detection {
        id: Uuid::new_v4(),
        kind: DetectionType::Id,
        text: "A1234567".to_string(),
        confidence: 90.0,
        bbox,
    }
}

/// Gradient so that unchanged pixels are distinguishable from fills
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 200])
    });
    encode_png(&DynamicImage::ImageRgb8(img)).unwrap()
}

#[cfg(test)]
mod redaction_tests {
    use super::*;

    #[test]
    fn test_redaction_is_idempotent() {
        let source = gradient_png(64, 48);
        let detections = vec![
            detection(BoundingBox::new(5.0, 5.0, 20.0, 8.0)),
            detection(BoundingBox::new(40.5, 30.2, 30.0, 30.0)),
        ];

        let once = redact(&source, &detections).unwrap();
        let twice = redact(&once, &detections).unwrap();

        let (a, _) = decode_image_bytes(&once).unwrap();
        let (b, _) = decode_image_bytes(&twice).unwrap();
        assert_eq!(a.to_rgba8(), b.to_rgba8());
    }

    #[test]
    fn test_no_detections_reencodes_unchanged() {
        let source = gradient_png(32, 16);
        let output = redact(&source, &[]).unwrap();

        assert_eq!(detect_format(&output).unwrap(), ImageFormat::Png);
        let (before, _) = decode_image_bytes(&source).unwrap();
        let (after, _) = decode_image_bytes(&output).unwrap();
        assert_eq!(before.to_rgba8(), after.to_rgba8());
    }

    #[test]
    fn test_box_past_edges_is_clipped() {
        let source = gradient_png(20, 10);
        let output = redact(
            &source,
            &[detection(BoundingBox::new(15.0, -5.0, 50.0, 8.0))],
        )
        .unwrap();
        let (after, _) = decode_image_bytes(&output).unwrap();
        let after = after.to_rgba8();

        assert_eq!(after.dimensions(), (20, 10));
        assert_eq!(*after.get_pixel(19, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*after.get_pixel(15, 7), Rgba([0, 0, 0, 255]));
        assert_ne!(*after.get_pixel(15, 8), Rgba([0, 0, 0, 255]));
        assert_ne!(*after.get_pixel(14, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_output_is_png_for_jpeg_input() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([240, 240, 240])));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let output = redact(jpeg.get_ref(), &[detection(BoundingBox::new(0.0, 0.0, 4.0, 4.0))]).unwrap();
        assert_eq!(detect_format(&output).unwrap(), ImageFormat::Png);
    }

    proptest! {
        #[test]
        fn prop_clamped_rect_stays_inside(
            img_w in 1u32..300,
            img_h in 1u32..300,
            left in -500.0f64..800.0,
            top in -500.0f64..800.0,
            width in -10.0f64..900.0,
            height in -10.0f64..900.0,
        ) {
            let rect = clamp_rect(&BoundingBox::new(left, top, width, height), img_w, img_h).unwrap();
            prop_assert!(rect.width >= 1 && rect.height >= 1);
            prop_assert!(rect.x + rect.width <= img_w);
            prop_assert!(rect.y + rect.height <= img_h);
        }

        #[test]
        fn prop_redact_image_never_panics(
            img_w in 1u32..40,
            img_h in 1u32..40,
            left in -100.0f64..100.0,
            top in -100.0f64..100.0,
            width in 0.0f64..200.0,
            height in 0.0f64..200.0,
        ) {
            let mut canvas = RgbaImage::from_pixel(img_w, img_h, Rgba([255, 255, 255, 255]));
            let drawn = redact_image(&mut canvas, &[detection(BoundingBox::new(left, top, width, height))]);
            prop_assert_eq!(drawn, 1);
            prop_assert_eq!(canvas.dimensions(), (img_w, img_h));
        }
    }
}
