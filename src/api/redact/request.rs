// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redaction request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::vision::image_utils::{decode_base64_payload, split_data_url, ALLOWED_MIME_TYPES};

/// An uploaded image, however it arrived
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// MIME type declared by the client
    pub mime_type: Option<String>,
}

/// JSON body for POST /v1/redact/base64
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactBase64Request {
    /// Base64 image, optionally as a `data:` URL
    #[serde(default)]
    pub image: Option<String>,

    /// MIME type; taken from the data URL when omitted
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl RedactBase64Request {
    pub fn validate(&self) -> Result<(), ApiError> {
        let image = self.image.as_deref().map(str::trim).unwrap_or("");
        if image.is_empty() {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }

        if let Some(mime) = self.declared_mime() {
            if !ALLOWED_MIME_TYPES.contains(&mime.to_ascii_lowercase().as_str()) {
                return Err(ApiError::UnsupportedMediaType(format!(
                    "'{}' is not an accepted image type, supported: {:?}",
                    mime, ALLOWED_MIME_TYPES
                )));
            }
        }

        Ok(())
    }

    /// Explicit `mimeType`, else the data URL's type
    pub fn declared_mime(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.image.as_deref().and_then(|i| split_data_url(i).0))
    }

    /// Validate and decode into an [`Upload`]
    pub fn into_upload(self) -> Result<Upload, ApiError> {
        self.validate()?;
        let mime_type = self.declared_mime().map(str::to_string);
        let bytes = decode_base64_payload(self.image.as_deref().unwrap_or(""))?;
        Ok(Upload { bytes, mime_type })
    }
}
