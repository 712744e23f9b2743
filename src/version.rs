// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir PII Redactor

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-pii-redaction-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "ocr-tesseract",
    "pii-email",
    "pii-phone",
    "pii-credit-card",
    "pii-date",
    "pii-address",
    "pii-name",
    "pii-id",
    "png-redaction",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir PII Redactor {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for the CLI
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
