// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR engine backed by the `tesseract` command-line binary
//!
//! Each worker owns a private temporary directory. The image is written there
//! and recognized with `tesseract <input> stdout -l <lang> tsv`; the TSV rows
//! are parsed into words (level 5) and lines (words grouped by
//! page/block/paragraph/line).

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, warn};

use super::{OcrEngine, OcrError, OcrWorker};
use crate::pii::{CornerBox, Line, OcrData, RawBox, RawLine, RawToken, Token, DEFAULT_CONFIDENCE};

/// TSV level of word rows
const WORD_LEVEL: u32 = 5;

/// Columns before the optional text column
const MIN_COLUMNS: usize = 11;

/// Tesseract invocation settings
#[derive(Debug, Clone, PartialEq)]
pub struct TesseractConfig {
    /// Binary name or path
    pub binary: String,
    /// Language pack, e.g. `eng`
    pub language: String,
    /// Page segmentation mode passed as `--psm`
    pub page_seg_mode: Option<u32>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            page_seg_mode: None,
        }
    }
}

/// Engine handing out tesseract workers
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TesseractConfig {
        &self.config
    }

    /// Start a worker with its own temporary directory
    pub fn worker(&self) -> Result<TesseractWorker, OcrError> {
        let dir = tempfile::Builder::new().prefix("pii-ocr-").tempdir()?;
        debug!("Tesseract worker directory: {}", dir.path().display());
        Ok(TesseractWorker {
            config: self.config.clone(),
            dir: Some(dir),
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, OcrError> {
        Ok(Box::new(self.worker()?))
    }
}

/// One tesseract worker; its directory is removed on termination
#[derive(Debug)]
pub struct TesseractWorker {
    config: TesseractConfig,
    dir: Option<TempDir>,
}

impl TesseractWorker {
    /// Working directory, `None` once terminated
    pub fn workdir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language);
        if let Some(psm) = self.config.page_seg_mode {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.arg("tsv");
        cmd
    }
}

impl OcrWorker for TesseractWorker {
    fn recognize(&mut self, image: &[u8]) -> Result<OcrData, OcrError> {
        let dir = self.dir.as_ref().ok_or(OcrError::Terminated)?;
        let input: PathBuf = dir.path().join("input.png");
        std::fs::write(&input, image)?;

        let output = self
            .command(&input)
            .output()
            .map_err(|source| OcrError::Launch {
                binary: self.config.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let data = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "Tesseract recognized {} words in {} lines",
            data.words.len(),
            data.lines.len()
        );
        Ok(data)
    }

    fn terminate(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to remove OCR directory {}: {}", path.display(), e);
            }
        }
    }
}

struct TsvRow<'a> {
    level: u32,
    line_key: (u32, u32, u32, u32),
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    confidence: f64,
    text: &'a str,
}

fn parse_row(line_no: usize, row: &str) -> Result<TsvRow<'_>, OcrError> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < MIN_COLUMNS {
        return Err(OcrError::MalformedOutput {
            line: line_no,
            reason: format!("expected at least {} columns, got {}", MIN_COLUMNS, fields.len()),
        });
    }

    let int = |idx: usize| -> Result<u32, OcrError> {
        fields[idx].trim().parse().map_err(|_| OcrError::MalformedOutput {
            line: line_no,
            reason: format!("column {} is not an integer: {:?}", idx + 1, fields[idx]),
        })
    };
    let num = |idx: usize| -> Result<f64, OcrError> {
        fields[idx].trim().parse().map_err(|_| OcrError::MalformedOutput {
            line: line_no,
            reason: format!("column {} is not a number: {:?}", idx + 1, fields[idx]),
        })
    };

    Ok(TsvRow {
        level: int(0)?,
        line_key: (int(1)?, int(2)?, int(3)?, int(4)?),
        left: num(6)?,
        top: num(7)?,
        width: num(8)?,
        height: num(9)?,
        confidence: num(10)?,
        text: fields.get(MIN_COLUMNS).copied().unwrap_or("").trim(),
    })
}

/// Parse tesseract TSV output
pub fn parse_tsv(tsv: &str) -> Result<OcrData, OcrError> {
    let mut words = Vec::new();
    let mut groups: Vec<((u32, u32, u32, u32), Vec<Token>)> = Vec::new();

    for (idx, row) in tsv.lines().enumerate() {
        if row.trim().is_empty() || row.starts_with("level") {
            continue;
        }
        let row = parse_row(idx + 1, row)?;
        if row.level != WORD_LEVEL || row.text.is_empty() {
            continue;
        }

        // Tesseract reports -1 for rows it has no confidence for
        let confidence = (row.confidence >= 0.0).then_some(row.confidence);
        words.push(RawToken {
            text: Some(row.text.to_string()),
            bbox: Some(RawBox::origin_extent(row.left, row.top, row.width, row.height)),
            confidence,
        });

        let token = Token::new(
            row.text,
            CornerBox::new(row.left, row.top, row.left + row.width, row.top + row.height),
            confidence.unwrap_or(DEFAULT_CONFIDENCE),
        );
        match groups.last_mut() {
            Some((key, tokens)) if *key == row.line_key => tokens.push(token),
            _ => groups.push((row.line_key, vec![token])),
        }
    }

    let lines: Vec<Line> = groups
        .iter()
        .filter_map(|(_, tokens)| Line::from_tokens(tokens))
        .collect();
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(OcrData {
        text,
        words,
        lines: lines
            .into_iter()
            .map(|line| RawLine {
                text: Some(line.text),
                bbox: Some(RawBox::corners(
                    line.bbox.x0,
                    line.bbox.y0,
                    line.bbox.x1,
                    line.bbox.y1,
                )),
                confidence: Some(line.confidence),
                ..Default::default()
            })
            .collect(),
    })
}
