// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR engine integration
//!
//! Components:
//! - `preprocessing` - Resize/grayscale/contrast/sharpen ahead of recognition
//! - `tesseract` - Engine backed by the `tesseract` command-line binary
//!
//! Engines hand out workers; a worker must be terminated once the request is
//! done with it. [`OcrSession`] owns a worker and terminates it on drop, so
//! every exit path of a request releases the worker.

pub mod preprocessing;
pub mod tesseract;

use thiserror::Error;
use tracing::debug;

use crate::pii::OcrData;

pub use preprocessing::{preprocess_image, PreprocessedImage, DEFAULT_TARGET_WIDTH};
pub use tesseract::{parse_tsv, TesseractConfig, TesseractEngine};

/// Errors raised by OCR engines and workers
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to launch OCR engine '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Malformed OCR output at line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("OCR worker I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR worker already terminated")]
    Terminated,
}

/// A source of OCR workers
pub trait OcrEngine: Send + Sync {
    /// Short engine name reported by the health endpoint
    fn name(&self) -> &str;

    /// Acquire a worker for one request
    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, OcrError>;
}

/// A single acquired OCR worker
pub trait OcrWorker: Send {
    /// Recognize text in encoded image bytes
    fn recognize(&mut self, image: &[u8]) -> Result<OcrData, OcrError>;

    /// Release the worker's resources; called exactly once
    fn terminate(&mut self);
}

/// Scoped OCR worker, terminated when dropped
pub struct OcrSession {
    worker: Option<Box<dyn OcrWorker>>,
    engine: String,
}

impl OcrSession {
    /// Acquire a worker from `engine`
    pub fn start(engine: &dyn OcrEngine) -> Result<Self, OcrError> {
        let worker = engine.start_worker()?;
        debug!("OCR worker started ({})", engine.name());
        Ok(Self {
            worker: Some(worker),
            engine: engine.name().to_string(),
        })
    }

    pub fn recognize(&mut self, image: &[u8]) -> Result<OcrData, OcrError> {
        self.worker
            .as_mut()
            .ok_or(OcrError::Terminated)?
            .recognize(image)
    }

    /// Terminate the worker now instead of at drop
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.terminate();
            debug!("OCR worker terminated ({})", self.engine);
        }
    }
}

impl Drop for OcrSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for OcrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrSession")
            .field("engine", &self.engine)
            .field("active", &self.worker.is_some())
            .finish()
    }
}
