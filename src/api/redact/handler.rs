// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redaction endpoint handlers

use std::time::Instant;

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use super::request::{RedactBase64Request, Upload};
use super::response::RedactResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::image_utils::{format_to_mime, to_data_url, validate_upload};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// POST /v1/redact - Redact PII from an uploaded image
///
/// Accepts `multipart/form-data` with the image in the `image` field.
///
/// # Response
/// - `extractedText`: Full OCR text
/// - `detections`: PII detections in original-image pixels
/// - `previewImage`: The upload as a data URL
/// - `redactedImage`: Redacted PNG as a data URL
/// - `processingTimeMs`, `originalWidth`, `originalHeight`
///
/// # Errors
/// - 400 Bad Request: Missing field, undecodable image
/// - 413 Payload Too Large: Upload above the configured limit
/// - 415 Unsupported Media Type: Not JPEG, PNG, GIF or WebP
/// - 504 Gateway Timeout: Redaction exceeded the request deadline
pub async fn redact_upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RedactResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    process_upload(&state, upload).await.map(Json)
}

/// POST /v1/redact/base64 - Redact PII from a base64 image
///
/// # Request
/// - `image`: Base64 image or data URL (required)
/// - `mimeType`: MIME type; defaults to the data URL's type
///
/// Same response and errors as `POST /v1/redact`.
pub async fn redact_base64_handler(
    State(state): State<AppState>,
    Json(request): Json<RedactBase64Request>,
) -> Result<Json<RedactResponse>, ApiError> {
    let upload = request.into_upload().map_err(|e| {
        warn!("Redact request validation failed: {}", e);
        e
    })?;
    process_upload(&state, upload).await.map(Json)
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        return Ok(Upload {
            bytes: bytes.to_vec(),
            mime_type,
        });
    }

    Err(ApiError::ValidationError {
        field: IMAGE_FIELD.to_string(),
        message: "No image uploaded".to_string(),
    })
}

async fn process_upload(state: &AppState, upload: Upload) -> Result<RedactResponse, ApiError> {
    let start = Instant::now();

    let format = validate_upload(
        &upload.bytes,
        upload.mime_type.as_deref(),
        state.max_upload_bytes,
    )?;
    debug!(
        "Accepted {:?} upload, {} bytes (declared {:?})",
        format,
        upload.bytes.len(),
        upload.mime_type
    );

    let mime = upload
        .mime_type
        .as_deref()
        .unwrap_or_else(|| format_to_mime(format))
        .to_string();
    let preview = to_data_url(&mime, &upload.bytes);

    let outcome = state.service.redact(upload.bytes).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        "Redacted {} PII regions in {}ms",
        outcome.detections.len(),
        elapsed_ms
    );

    Ok(RedactResponse::new(outcome, preview, elapsed_ms))
}
