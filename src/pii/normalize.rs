// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Token normalization
//!
//! OCR engines report geometry in different shapes: corner pairs
//! (`x0,y0,x1,y1`), origin+extent (`x,y,w,h`), or partially missing fields.
//! Everything here converts that raw output into [`Token`]s and [`Line`]s with
//! a usable corner-form box. Malformed geometry is logged and replaced with a
//! fallback box; it never fails.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::types::{CornerBox, Line, Token};

/// Width used when a token carries no usable horizontal extent
pub const FALLBACK_WIDTH: f64 = 100.0;

/// Height used when a token carries no usable vertical extent
pub const FALLBACK_HEIGHT: f64 = 20.0;

/// Raw bounding box as reported by an OCR engine; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, alias = "width", skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, alias = "height", skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

impl RawBox {
    pub fn corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: Some(x0),
            y0: Some(y0),
            x1: Some(x1),
            y1: Some(y1),
            ..Default::default()
        }
    }

    pub fn origin_extent(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Default::default()
        }
    }
}

/// Raw OCR word
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "boundingBox")]
    pub bbox: Option<RawBox>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Raw OCR line; geometry may be nested under `bbox` or given flat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "boundingBox")]
    pub bbox: Option<RawBox>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, alias = "width", skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, alias = "height", skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

impl RawLine {
    /// Geometry of the line, falling back to the flat `x,y,w,h` fields
    /// (origin 0, extent 1 where missing)
    fn geometry(&self) -> RawBox {
        match &self.bbox {
            Some(bbox) => bbox.clone(),
            None => RawBox::origin_extent(
                self.x.unwrap_or(0.0),
                self.y.unwrap_or(0.0),
                self.w.unwrap_or(1.0),
                self.h.unwrap_or(1.0),
            ),
        }
    }
}

/// Full OCR output for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<RawToken>,
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

impl OcrData {
    /// Normalize words and lines, dropping entries without text
    pub fn normalize(&self, default_confidence: f64) -> (Vec<Token>, Vec<Line>) {
        let tokens = self
            .words
            .iter()
            .filter_map(|w| normalize_token(w, default_confidence))
            .collect();
        let lines = self
            .lines
            .iter()
            .filter_map(|l| normalize_line(l, default_confidence))
            .collect();
        (tokens, lines)
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Convert a raw box to corner form
///
/// Explicit corners win; otherwise corners are derived from origin+extent.
/// Anything still missing is filled from a box anchored at the known origin
/// (or 0) with the known extent (or 100x20), and a warning naming `text` is
/// logged.
pub fn normalize_bbox(raw: &RawBox, text: &str) -> CornerBox {
    let x = finite(raw.x);
    let y = finite(raw.y);
    let w = finite(raw.w);
    let h = finite(raw.h);

    let x0 = finite(raw.x0).or(x);
    let y0 = finite(raw.y0).or(y);
    let x1 = finite(raw.x1).or_else(|| Some(x? + w?));
    let y1 = finite(raw.y1).or_else(|| Some(y? + h?));

    match (x0, y0, x1, y1) {
        (Some(x0), Some(y0), Some(x1), Some(y1)) => CornerBox::new(x0, y0, x1, y1),
        _ => {
            warn!(
                "Invalid bbox for OCR token {:?} ({:?}), using fallback geometry",
                text, raw
            );
            let x0 = x0.unwrap_or(0.0);
            let y0 = y0.unwrap_or(0.0);
            let x1 = x1.unwrap_or(x0 + w.unwrap_or(FALLBACK_WIDTH));
            let y1 = y1.unwrap_or(y0 + h.unwrap_or(FALLBACK_HEIGHT));
            CornerBox::new(x0, y0, x1, y1)
        }
    }
}

fn confidence_or_default(confidence: Option<f64>, default_confidence: f64) -> f64 {
    finite(confidence).unwrap_or(default_confidence)
}

/// Normalize a raw OCR word; `None` when its text is empty after trimming
pub fn normalize_token(raw: &RawToken, default_confidence: f64) -> Option<Token> {
    let text = raw.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return None;
    }
    let bbox = normalize_bbox(raw.bbox.as_ref().unwrap_or(&RawBox::default()), text);
    Some(Token::new(
        text,
        bbox,
        confidence_or_default(raw.confidence, default_confidence),
    ))
}

/// Normalize a raw OCR line; `None` when its text is empty after trimming
pub fn normalize_line(raw: &RawLine, default_confidence: f64) -> Option<Line> {
    let text = raw.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return None;
    }
    let bbox = normalize_bbox(&raw.geometry(), text);
    Some(Line::new(
        text,
        bbox,
        confidence_or_default(raw.confidence, default_confidence),
    ))
}
