// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mapping detections from OCR-processing space back to the original image

use serde::{Deserialize, Serialize};

use super::types::{BoundingBox, Detection};

/// Width and height of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Per-axis factors taking processed coordinates to original coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn axis_scale(original: Option<u32>, processed: Option<u32>) -> f64 {
    match (original, processed) {
        (Some(o), Some(p)) if o > 0 && p > 0 => o as f64 / p as f64,
        _ => 1.0,
    }
}

impl ScaleFactors {
    pub const IDENTITY: ScaleFactors = ScaleFactors { x: 1.0, y: 1.0 };

    /// `original / processed` per axis; 1 on any axis whose size is missing or zero
    pub fn between(original: Option<ImageSize>, processed: Option<ImageSize>) -> Self {
        Self {
            x: axis_scale(original.map(|s| s.width), processed.map(|s| s.width)),
            y: axis_scale(original.map(|s| s.height), processed.map(|s| s.height)),
        }
    }

    /// Factors undoing this scaling
    pub fn inverse(&self) -> Self {
        Self {
            x: 1.0 / self.x,
            y: 1.0 / self.y,
        }
    }

    pub fn apply(&self, bbox: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: bbox.left * self.x,
            top: bbox.top * self.y,
            width: bbox.width * self.x,
            height: bbox.height * self.y,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Scale every detection box by `factors`
pub fn rescale_with(detections: Vec<Detection>, factors: ScaleFactors) -> Vec<Detection> {
    detections
        .into_iter()
        .map(|mut det| {
            det.bbox = factors.apply(&det.bbox);
            det
        })
        .collect()
}

/// Map detections from processed-image space into original-image space
pub fn rescale(
    detections: Vec<Detection>,
    original: Option<ImageSize>,
    processed: Option<ImageSize>,
) -> Vec<Detection> {
    rescale_with(detections, ScaleFactors::between(original, processed))
}
