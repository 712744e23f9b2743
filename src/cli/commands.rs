// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::api::start_server;
use crate::config::{RedactorConfig, ENV_OCR_LANGUAGE, ENV_TESSERACT_PATH};
use crate::pii::{Detection, ImageSize, OcrData};
use crate::pipeline::{RedactionPipeline, RedactionService};
use crate::vision::ocr::TesseractEngine;

/// Arguments for the redact command
#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Image to redact (JPEG, PNG, GIF or WebP)
    pub image: PathBuf,

    /// Where to write the redacted PNG
    #[arg(long, short)]
    pub output: PathBuf,

    /// Also write the detections as JSON
    #[arg(long)]
    pub detections: Option<PathBuf>,

    /// Tesseract binary
    #[arg(long, env = ENV_TESSERACT_PATH)]
    pub tesseract: Option<String>,

    /// OCR language pack
    #[arg(long, env = ENV_OCR_LANGUAGE)]
    pub language: Option<String>,
}

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// OCR output as JSON (`text`, `words`, `lines`)
    pub ocr_json: PathBuf,

    /// Original image size, e.g. 1240x1754
    #[arg(long, value_parser = parse_size, requires = "processed")]
    pub original: Option<ImageSize>,

    /// Size of the image the OCR engine saw, e.g. 2000x2829
    #[arg(long, value_parser = parse_size, requires = "original")]
    pub processed: Option<ImageSize>,

    /// Write detections here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overrides REDACTOR_LISTEN_ADDR
    #[arg(long)]
    pub listen: Option<String>,
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(value: &str) -> Result<ImageSize, String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{}': {}", w, e))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{}': {}", h, e))?;
    Ok(ImageSize::new(width, height))
}

fn load_config() -> Result<RedactorConfig> {
    let config = RedactorConfig::from_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn write_detections(path: &Path, detections: &[Detection]) -> Result<()> {
    let json = serde_json::to_string_pretty(detections)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn redact(args: RedactArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(binary) = args.tesseract {
        config.tesseract.binary = binary;
    }
    if let Some(language) = args.language {
        config.tesseract.language = language;
    }

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let engine = TesseractEngine::new(config.tesseract.clone());
    let pipeline = RedactionPipeline::new(Arc::new(engine))
        .with_classifier(config.classifier.clone())
        .with_target_width(config.ocr_target_width);
    let service = RedactionService::new(pipeline, 1, config.request_timeout);

    let outcome = service
        .redact(bytes)
        .await
        .map_err(|e| anyhow!("Redaction failed: {}", e))?;

    std::fs::write(&args.output, &outcome.redacted_png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    if let Some(path) = &args.detections {
        write_detections(path, &outcome.detections)?;
    }

    info!(
        "Wrote {} ({} detections)",
        args.output.display(),
        outcome.detections.len()
    );
    for det in &outcome.detections {
        println!(
            "{:<12} {:>6.1}  [{:.0},{:.0} {:.0}x{:.0}]  {}",
            det.kind.as_str(),
            det.confidence,
            det.bbox.left,
            det.bbox.top,
            det.bbox.width,
            det.bbox.height,
            det.text
        );
    }
    Ok(())
}

/// Classify an OCR JSON file; returns the detections it wrote
pub fn detect(args: DetectArgs) -> Result<Vec<Detection>> {
    let config = load_config()?;
    let raw = std::fs::read_to_string(&args.ocr_json)
        .with_context(|| format!("Failed to read {}", args.ocr_json.display()))?;
    let data: OcrData = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid OCR JSON", args.ocr_json.display()))?;

    let classifier = crate::pii::PiiClassifier::new(config.classifier);
    let detections = crate::pii::rescale(
        classifier.classify_ocr(&data),
        args.original,
        args.processed,
    );

    match &args.output {
        Some(path) => write_detections(path, &detections)?,
        None => println!("{}", serde_json::to_string_pretty(&detections)?),
    }
    Ok(detections)
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    config.validate().context("Invalid configuration")?;

    let engine = Arc::new(TesseractEngine::new(config.tesseract.clone()));
    start_server(config, engine).await
}
