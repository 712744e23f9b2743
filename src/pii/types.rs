// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core geometry and detection types shared by every pipeline stage

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence assigned to tokens and lines when the OCR engine omits one
pub const DEFAULT_CONFIDENCE: f64 = 85.0;

/// Rectangle in corner form, used before tokens are aggregated into detections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl CornerBox {
    /// Create a corner box, swapping coordinates so that `x1 >= x0` and `y1 >= y0`
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &CornerBox) -> CornerBox {
        CornerBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of an iterator of boxes, `None` when empty
    pub fn union_all<'a, I>(boxes: I) -> Option<CornerBox>
    where
        I: IntoIterator<Item = &'a CornerBox>,
    {
        boxes
            .into_iter()
            .copied()
            .reduce(|acc, b| acc.union(&b))
    }

    /// Convert to origin+extent form
    ///
    /// The origin is clamped to be non-negative and the extent is at least 1,
    /// measured from the unclamped corners.
    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox {
            left: self.x0.max(0.0),
            top: self.y0.max(0.0),
            width: (self.x1 - self.x0).max(1.0),
            height: (self.y1 - self.y0).max(1.0),
        }
    }
}

/// Rectangle in origin+extent form, used once detections exist
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Area of the intersection with another box (0 when disjoint)
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let overlap_x = (self.right().min(other.right()) - self.left.max(other.left)).max(0.0);
        let overlap_y = (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0);
        overlap_x * overlap_y
    }
}

/// One OCR-recognized word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub bbox: CornerBox,
    pub confidence: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: CornerBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// One OCR-recognized line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub bbox: CornerBox,
    pub confidence: f64,
}

impl Line {
    pub fn new(text: impl Into<String>, bbox: CornerBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }

    /// Build a line from a run of tokens: joined text, union box, mean confidence
    ///
    /// Returns `None` for an empty run.
    pub fn from_tokens(tokens: &[Token]) -> Option<Self> {
        let bbox = CornerBox::union_all(tokens.iter().map(|t| &t.bbox))?;
        let text = tokens
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence = tokens.iter().map(|t| t.confidence).sum::<f64>() / tokens.len() as f64;
        Some(Self {
            text,
            bbox,
            confidence,
        })
    }
}

/// Kind of personally identifiable information a detection holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    Email,
    Phone,
    CreditCard,
    Date,
    Address,
    Name,
    Id,
}

impl DetectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::Email => "email",
            DetectionType::Phone => "phone",
            DetectionType::CreditCard => "credit_card",
            DetectionType::Date => "date",
            DetectionType::Address => "address",
            DetectionType::Name => "name",
            DetectionType::Id => "id",
        }
    }
}

impl std::fmt::Display for DetectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified PII span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: DetectionType,
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Aggregate a span of tokens into a detection
    ///
    /// Returns `None` for an empty span. The text is the trimmed, space-joined
    /// token text unless `text_override` is given.
    pub fn from_tokens(
        kind: DetectionType,
        tokens: &[Token],
        text_override: Option<&str>,
    ) -> Option<Self> {
        let bbox = CornerBox::union_all(tokens.iter().map(|t| &t.bbox))?;
        let text = match text_override {
            Some(text) => text.to_string(),
            None => tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string(),
        };
        let confidence = tokens.iter().map(|t| t.confidence).sum::<f64>() / tokens.len() as f64;

        Some(Self {
            id: Uuid::new_v4(),
            kind,
            text,
            confidence,
            bbox: bbox.to_bounding_box(),
        })
    }

    /// Detection covering a whole OCR line
    pub fn from_line(kind: DetectionType, line: &Line, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text: line.text.trim().to_string(),
            confidence,
            bbox: line.bbox.to_bounding_box(),
        }
    }
}
