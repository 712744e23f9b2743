// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration
//!
//! Every setting has a default and may be overridden through a `REDACTOR_*`
//! environment variable. Unparseable values fall back to the default.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::pii::ClassifierConfig;
use crate::vision::ocr::{TesseractConfig, DEFAULT_TARGET_WIDTH};
use crate::vision::DEFAULT_MAX_UPLOAD_BYTES;

pub const ENV_LISTEN_ADDR: &str = "REDACTOR_LISTEN_ADDR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "REDACTOR_MAX_UPLOAD_BYTES";
pub const ENV_OCR_WIDTH: &str = "REDACTOR_OCR_WIDTH";
pub const ENV_TESSERACT_PATH: &str = "REDACTOR_TESSERACT_PATH";
pub const ENV_OCR_LANGUAGE: &str = "REDACTOR_OCR_LANGUAGE";
pub const ENV_OCR_PSM: &str = "REDACTOR_OCR_PSM";
pub const ENV_MAX_CONCURRENT_OCR: &str = "REDACTOR_MAX_CONCURRENT_OCR";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REDACTOR_REQUEST_TIMEOUT_SECS";
pub const ENV_OVERLAP_THRESHOLD: &str = "REDACTOR_OVERLAP_THRESHOLD";
pub const ENV_DEFAULT_CONFIDENCE: &str = "REDACTOR_DEFAULT_CONFIDENCE";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedactorConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Width images are resized to before OCR
    pub ocr_target_width: u32,
    pub tesseract: TesseractConfig,
    /// OCR runs allowed at once
    pub max_concurrent_ocr: usize,
    /// Per-request deadline; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub classifier: ClassifierConfig,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr_target_width: DEFAULT_TARGET_WIDTH,
            tesseract: TesseractConfig::default(),
            max_concurrent_ocr: 4,
            request_timeout: Some(Duration::from_secs(60)),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl RedactorConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        let request_timeout = match lookup(ENV_REQUEST_TIMEOUT_SECS)
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };

        Self {
            listen_addr: lookup(ENV_LISTEN_ADDR).unwrap_or(defaults.listen_addr),
            max_upload_bytes: lookup(ENV_MAX_UPLOAD_BYTES)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            ocr_target_width: lookup(ENV_OCR_WIDTH)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.ocr_target_width),
            tesseract: TesseractConfig {
                binary: lookup(ENV_TESSERACT_PATH).unwrap_or(defaults.tesseract.binary),
                language: lookup(ENV_OCR_LANGUAGE).unwrap_or(defaults.tesseract.language),
                page_seg_mode: lookup(ENV_OCR_PSM)
                    .and_then(|v| v.trim().parse().ok())
                    .or(defaults.tesseract.page_seg_mode),
            },
            max_concurrent_ocr: lookup(ENV_MAX_CONCURRENT_OCR)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_concurrent_ocr),
            request_timeout,
            classifier: ClassifierConfig {
                default_confidence: parsed(ENV_DEFAULT_CONFIDENCE)
                    .unwrap_or(defaults.classifier.default_confidence),
                overlap_threshold: parsed(ENV_OVERLAP_THRESHOLD)
                    .unwrap_or(defaults.classifier.overlap_threshold),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(invalid("listen_addr", format!("not a socket address: {}", self.listen_addr)));
        }
        if self.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes", "must be positive"));
        }
        if self.ocr_target_width == 0 {
            return Err(invalid("ocr_target_width", "must be positive"));
        }
        if self.tesseract.binary.trim().is_empty() {
            return Err(invalid("tesseract.binary", "must not be empty"));
        }
        if self.tesseract.language.trim().is_empty() {
            return Err(invalid("tesseract.language", "must not be empty"));
        }
        if self.max_concurrent_ocr == 0 {
            return Err(invalid("max_concurrent_ocr", "must be at least 1"));
        }
        let threshold = self.classifier.overlap_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid("overlap_threshold", format!("{} is outside [0, 1]", threshold)));
        }
        let confidence = self.classifier.default_confidence;
        if !(0.0..=100.0).contains(&confidence) {
            return Err(invalid("default_confidence", format!("{} is outside [0, 100]", confidence)));
        }
        Ok(())
    }
}
