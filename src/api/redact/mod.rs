// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redaction API endpoint module
//!
//! Provides POST /v1/redact (multipart upload) and POST /v1/redact/base64
//! (JSON body) for detecting PII in an image and blacking it out.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{redact_base64_handler, redact_upload_handler};
pub use request::{RedactBase64Request, Upload};
pub use response::RedactResponse;
