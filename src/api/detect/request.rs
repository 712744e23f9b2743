// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request and response types

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::pii::{Detection, ImageSize, OcrData};

/// JSON body for POST /v1/detect
///
/// The OCR fields (`text`, `words`, `lines`) sit at the top level; word and
/// line boxes may use any of the accepted geometry shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    #[serde(flatten)]
    pub ocr: OcrData,

    /// Size of the image the detections should be mapped onto
    #[serde(default)]
    pub original_size: Option<ImageSize>,

    /// Size of the image the OCR engine saw
    #[serde(default)]
    pub processed_size: Option<ImageSize>,
}

impl DetectRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.ocr.words.is_empty() && self.ocr.lines.is_empty() && !self.ocr.text.trim().is_empty()
        {
            return Err(ApiError::ValidationError {
                field: "words".to_string(),
                message: "words or lines are required to locate detections".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
}
