// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end redaction: decode, OCR, classify, rescale, composite
//!
//! [`RedactionPipeline`] is synchronous and request-scoped. [`RedactionService`]
//! runs it on the blocking pool behind a concurrency limit and an optional
//! deadline.

use std::sync::Arc;
use std::time::Duration;

use image::ImageFormat;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::pii::{rescale, ClassifierConfig, Detection, ImageSize, OcrData, PiiClassifier};
use crate::vision::ocr::{preprocess_image, OcrEngine, OcrError, OcrSession, DEFAULT_TARGET_WIDTH};
use crate::vision::{decode_image_bytes, redact_decoded, ImageError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Redaction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Redaction task failed: {0}")]
    Task(String),

    #[error("Redaction service is shutting down")]
    Closed,
}

/// Result of one redaction run
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    /// Full OCR text
    pub extracted_text: String,
    /// Detections in original-image coordinates
    pub detections: Vec<Detection>,
    /// Redacted image, PNG encoded
    pub redacted_png: Vec<u8>,
    /// Format of the uploaded image
    pub source_format: ImageFormat,
    pub original_size: ImageSize,
    /// Size of the image the OCR engine saw
    pub processed_size: ImageSize,
}

/// Synchronous redaction pipeline over a pluggable OCR engine
pub struct RedactionPipeline {
    engine: Arc<dyn OcrEngine>,
    classifier: PiiClassifier,
    target_width: u32,
}

impl RedactionPipeline {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            classifier: PiiClassifier::default(),
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }

    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = PiiClassifier::new(config);
        self
    }

    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = width.max(1);
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn classifier(&self) -> &PiiClassifier {
        &self.classifier
    }

    /// Classify OCR output and map it into original-image space
    pub fn detect(
        &self,
        data: &OcrData,
        original: Option<ImageSize>,
        processed: Option<ImageSize>,
    ) -> Vec<Detection> {
        rescale(self.classifier.classify_ocr(data), original, processed)
    }

    /// Run the full pipeline on uploaded image bytes
    ///
    /// The OCR worker is held for the whole run and released on every exit
    /// path.
    pub fn run(&self, bytes: &[u8]) -> Result<RedactionOutcome, PipelineError> {
        let (image, info) = decode_image_bytes(bytes)?;
        debug!(
            "Decoded {:?} image: {}x{}, {} bytes",
            info.format, info.width, info.height, info.size_bytes
        );

        let prepared = preprocess_image(&image, self.target_width)?;

        let mut session = OcrSession::start(self.engine.as_ref())?;
        let data = session.recognize(&prepared.png)?;
        debug!(
            "OCR returned {} words, {} lines",
            data.words.len(),
            data.lines.len()
        );

        let detections = self.detect(
            &data,
            Some(prepared.original_size),
            Some(prepared.processed_size),
        );
        let redacted_png = redact_decoded(&image, &detections)?;
        session.finish();

        Ok(RedactionOutcome {
            extracted_text: data.text,
            detections,
            redacted_png,
            source_format: info.format,
            original_size: prepared.original_size,
            processed_size: prepared.processed_size,
        })
    }
}

/// Async front for [`RedactionPipeline`]
#[derive(Clone)]
pub struct RedactionService {
    pipeline: Arc<RedactionPipeline>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl RedactionService {
    /// `max_concurrent` is raised to 1 if zero
    pub fn new(pipeline: RedactionPipeline, max_concurrent: usize, timeout: Option<Duration>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn pipeline(&self) -> &RedactionPipeline {
        &self.pipeline
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Redact `bytes` on the blocking pool
    ///
    /// The deadline covers waiting for a permit and the run itself. On timeout
    /// the blocking task is left to finish; it still releases its permit and
    /// OCR worker when it does.
    pub async fn redact(&self, bytes: Vec<u8>) -> Result<RedactionOutcome, PipelineError> {
        let pipeline = self.pipeline.clone();
        let permits = self.permits.clone();

        let work = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::Closed)?;
            let task = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                pipeline.run(&bytes)
            });
            task.await
                .map_err(|e| PipelineError::Task(e.to_string()))?
        };

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                warn!("Redaction exceeded {:?}, abandoning request", limit);
                PipelineError::Timeout(limit)
            })?,
            None => work.await,
        }?;

        info!(
            "Redaction complete: {} detections on {}x{} image",
            outcome.detections.len(),
            outcome.original_size.width,
            outcome.original_size.height
        );
        Ok(outcome)
    }
}
