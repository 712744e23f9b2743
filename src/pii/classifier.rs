// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Three-pass PII classifier
//!
//! Passes, in precedence order:
//! 1. single token (email, card number, numeric id)
//! 2. sliding window of 1..=6 tokens (phone, date, address, name, id, date range)
//! 3. whole OCR lines, for layouts the window cannot span
//!
//! Candidates from all passes are merged by [`deduplicate`].

use std::slice;

use tracing::debug;

use super::dedup::{deduplicate, DEFAULT_OVERLAP_THRESHOLD};
use super::normalize::OcrData;
use super::rules::{LineConfidence, RuleSet, Window, WindowRule};
use super::types::{Detection, Line, Token, DEFAULT_CONFIDENCE};

/// Tunables for the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Confidence given to tokens and lines the OCR engine reported without one
    pub default_confidence: f64,
    /// Same-type overlap ratio above which candidates are merged
    pub overlap_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_confidence: DEFAULT_CONFIDENCE,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

/// Rule-driven PII classifier over normalized OCR tokens and lines
#[derive(Debug, Clone, Default)]
pub struct PiiClassifier {
    rules: RuleSet,
    config: ClassifierConfig,
}

impl PiiClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            rules: RuleSet::default(),
            config,
        }
    }

    /// Use custom rule tables
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Pass 1: each token matched on its own
    pub fn token_pass(&self, tokens: &[Token]) -> Vec<Detection> {
        tokens
            .iter()
            .filter_map(|token| {
                let text = token.text.trim();
                if text.is_empty() {
                    return None;
                }
                let rule = self.rules.first_token_match(text)?;
                Detection::from_tokens(rule.kind, slice::from_ref(token), Some(text))
            })
            .collect()
    }

    /// First window starting at `start` that satisfies a rule
    ///
    /// Spans grow from 1 token up to the configured maximum; the shortest span
    /// with a matching rule wins, even if a longer span would match a more
    /// specific rule.
    pub fn first_window_at<'a>(
        &self,
        tokens: &'a [Token],
        start: usize,
    ) -> Option<(&WindowRule, Window<'a>)> {
        if start >= tokens.len() {
            return None;
        }
        let max_end = (start + self.rules.max_window_span).min(tokens.len());
        (start + 1..=max_end).find_map(|end| {
            let window = Window::new(&tokens[start..end]);
            self.rules
                .first_window_match(&window)
                .map(|rule| (rule, window))
        })
    }

    /// Pass 2: sliding windows over consecutive tokens
    pub fn window_pass(&self, tokens: &[Token]) -> Vec<Detection> {
        (0..tokens.len())
            .filter_map(|start| {
                let (rule, window) = self.first_window_at(tokens, start)?;
                Detection::from_tokens(rule.kind, window.tokens, Some(&window.text))
            })
            .collect()
    }

    /// Pass 3: whole lines
    pub fn line_pass(&self, lines: &[Line]) -> Vec<Detection> {
        lines
            .iter()
            .filter_map(|line| {
                let text = line.text.trim();
                if text.is_empty() {
                    return None;
                }
                let rule = self.rules.first_line_match(text)?;
                let confidence = match rule.confidence {
                    LineConfidence::FromLine => line.confidence,
                    LineConfidence::Fixed(value) => value,
                };
                Some(Detection::from_line(rule.kind, line, confidence))
            })
            .collect()
    }

    /// Raw candidates from all three passes, before deduplication
    pub fn candidates(&self, tokens: &[Token], lines: &[Line]) -> Vec<Detection> {
        let tokens: Vec<Token> = tokens
            .iter()
            .filter(|t| !t.text.trim().is_empty())
            .cloned()
            .collect();

        let single = self.token_pass(&tokens);
        let windows = self.window_pass(&tokens);
        let line_hits = self.line_pass(lines);
        debug!(
            "PII candidates: {} single-token, {} window, {} line",
            single.len(),
            windows.len(),
            line_hits.len()
        );

        let mut all = single;
        all.extend(windows);
        all.extend(line_hits);
        all
    }

    /// Classify and deduplicate; boxes stay in the tokens' coordinate space
    pub fn classify(&self, tokens: &[Token], lines: &[Line]) -> Vec<Detection> {
        let raw = self.candidates(tokens, lines);
        let raw_count = raw.len();
        let detections = deduplicate(raw, self.config.overlap_threshold);
        debug!(
            "Deduplicated {} PII candidates into {} detections",
            raw_count,
            detections.len()
        );
        detections
    }

    /// Normalize raw OCR output and classify it
    pub fn classify_ocr(&self, data: &OcrData) -> Vec<Detection> {
        let (tokens, lines) = data.normalize(self.config.default_confidence);
        self.classify(&tokens, &lines)
    }
}

/// Classify tokens and lines with the default rule tables
pub fn classify(tokens: &[Token], lines: &[Line]) -> Vec<Detection> {
    PiiClassifier::default().classify(tokens, lines)
}
