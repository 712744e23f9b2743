// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PII detection over OCR output
//!
//! Raw OCR words and lines are normalized into [`Token`]s and [`Line`]s,
//! classified by a three-pass rule engine, deduplicated, and finally mapped
//! back into original-image coordinates.

pub mod classifier;
pub mod dedup;
pub mod normalize;
pub mod rescale;
pub mod rules;
pub mod types;

pub use classifier::{classify, ClassifierConfig, PiiClassifier};
pub use dedup::{deduplicate, overlap_ratio, DEFAULT_OVERLAP_THRESHOLD};
pub use normalize::{normalize_bbox, normalize_line, normalize_token, OcrData, RawBox, RawLine, RawToken};
pub use rescale::{rescale, rescale_with, ImageSize, ScaleFactors};
pub use rules::{RuleSet, Window};
pub use types::{BoundingBox, CornerBox, Detection, DetectionType, Line, Token, DEFAULT_CONFIDENCE};

/// Detect PII in raw OCR output and map the boxes into original-image space
///
/// `processed` is the size of the image the OCR engine saw, `original` the
/// size of the image that will be redacted.
pub fn detect(
    data: &OcrData,
    original: Option<ImageSize>,
    processed: Option<ImageSize>,
) -> Vec<Detection> {
    let detections = PiiClassifier::default().classify_ocr(data);
    rescale(detections, original, processed)
}
