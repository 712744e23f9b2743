// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-only API endpoint module
//!
//! Provides POST /v1/detect for classifying OCR output the caller already has.

pub mod handler;
pub mod request;

pub use handler::detect_handler;
pub use request::{DetectRequest, DetectResponse};
