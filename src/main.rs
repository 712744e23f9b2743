// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use fabstir_pii_redactor::{
    api::start_server, config::RedactorConfig, version, vision::ocr::TesseractEngine,
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Fabstir PII Redactor...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = RedactorConfig::from_env();
    config.validate().context("Invalid configuration")?;

    info!(
        "OCR: {} (lang {}), working width {}px, {} concurrent",
        config.tesseract.binary,
        config.tesseract.language,
        config.ocr_target_width,
        config.max_concurrent_ocr
    );
    info!(
        "Uploads up to {} bytes, request timeout {:?}",
        config.max_upload_bytes, config.request_timeout
    );

    let engine = Arc::new(TesseractEngine::new(config.tesseract.clone()));
    start_server(config, engine).await
}
