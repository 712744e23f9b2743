// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redaction response types

use serde::{Deserialize, Serialize};

use crate::pii::Detection;
use crate::pipeline::RedactionOutcome;
use crate::vision::image_utils::to_data_url;

/// Response from a redaction request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactResponse {
    /// Full OCR text
    pub extracted_text: String,
    /// Detections in original-image coordinates
    pub detections: Vec<Detection>,
    /// Uploaded image as a data URL
    pub preview_image: String,
    /// Redacted PNG as a data URL
    pub redacted_image: String,
    pub processing_time_ms: u64,
    pub original_width: u32,
    pub original_height: u32,
}

impl RedactResponse {
    pub fn new(outcome: RedactionOutcome, preview_image: String, processing_time_ms: u64) -> Self {
        Self {
            extracted_text: outcome.extracted_text,
            detections: outcome.detections,
            preview_image,
            redacted_image: to_data_url("image/png", &outcome.redacted_png),
            processing_time_ms,
            original_width: outcome.original_size.width,
            original_height: outcome.original_size.height,
        }
    }
}
