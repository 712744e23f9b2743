// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pii;
pub mod pipeline;
pub mod version;
pub mod vision;

pub use config::RedactorConfig;
pub use pii::{
    classify, detect, rescale, ClassifierConfig, Detection, DetectionType, ImageSize, OcrData,
    PiiClassifier,
};
pub use pipeline::{PipelineError, RedactionOutcome, RedactionPipeline, RedactionService};
pub use vision::{redact, ImageError, OcrEngine, OcrError, OcrSession, OcrWorker};
