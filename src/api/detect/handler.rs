// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handler

use axum::{extract::State, Json};
use tracing::{debug, warn};

use super::request::{DetectRequest, DetectResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /v1/detect - Classify OCR output without touching an image
///
/// Runs the classifier and deduplication on the supplied words and lines, then
/// rescales the boxes from `processedSize` to `originalSize` when both are
/// given.
pub async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    if let Err(e) = request.validate() {
        warn!("Detect validation failed: {}", e);
        return Err(e);
    }

    let detections = state.service.pipeline().detect(
        &request.ocr,
        request.original_size,
        request.processed_size,
    );
    debug!(
        "Detect: {} words, {} lines -> {} detections",
        request.ocr.words.len(),
        request.ocr.lines.len(),
        detections.len()
    );

    Ok(Json(DetectResponse { detections }))
}
