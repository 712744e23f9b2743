// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ordered PII rule tables
//!
//! Each classifier pass walks one table in order and stops at the first
//! rule whose span constraints and predicate are satisfied. Precedence is the
//! position in the table, so callers can reorder, extend or replace rules
//! without touching the classifier.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{DetectionType, Token};

// Digit, space and word-boundary classes are ASCII only (`(?-u)`).
macro_rules! pii_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

pii_pattern!(RE_EMAIL, r"(?i-u)[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}");

// Optional country code, optional bracketed prefix, then 8+ digits with separators
pii_pattern!(
    RE_PHONE,
    r"(?-u)(?:\+?\d{1,3}[\s\-]?)?(?:\(\+?\d{1,3}\)[\s\-]?)?\d[\d\s\-()]{6,}\d"
);

pii_pattern!(RE_CREDIT_CARD, r"(?-u)\b(?:\d[ \-]*?){13,16}\b");

pii_pattern!(
    RE_DATE,
    r"(?i-u)\b(?:\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{2,4})\b"
);

pii_pattern!(
    RE_ADDRESS_HINT,
    r"(?i-u)\b(?:Street|St|Road|Rd|Avenue|Ave|Lane|Ln|Block|District|State)\b"
);

pii_pattern!(RE_LONG_ALNUM, r"(?-u)\b[A-Za-z0-9][A-Za-z0-9\-]{7,}\b");

pii_pattern!(RE_DIGIT_RUN, r"(?-u)\d{4,}");

pii_pattern!(RE_NUMERIC_ID, r"(?-u)\b\d{4,}\b");

pii_pattern!(RE_RANGE_CONNECTOR, r"(?i-u)\b(?:to|through|until)\b");

pii_pattern!(RE_TITLE_WORD, r"^[A-Z][a-z'.\-]*$");

pii_pattern!(RE_UPPER_WORD, r"^[A-Z][A-Z'.\-]*$");

pii_pattern!(RE_ALPHA_WORD, r"^[A-Za-z][A-Za-z'.\-]*$");

pii_pattern!(RE_LINE_NAME_WORD, r"^[A-Z][A-Za-z'.\-]*$");

/// Maximum sliding-window span in tokens
pub const MAX_WINDOW_SPAN: usize = 6;

/// Confidence assigned to lines classified only by the name-like heuristic
pub const LINE_NAME_CONFIDENCE: f64 = 88.0;

fn is_match(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    (**pattern).as_ref().is_some_and(|re| re.is_match(text))
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

fn dialable_count(text: &str) -> usize {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .count()
}

pub fn is_email(text: &str) -> bool {
    is_match(&RE_EMAIL, text)
}

pub fn is_credit_card(text: &str) -> bool {
    is_match(&RE_CREDIT_CARD, text)
}

pub fn is_date(text: &str) -> bool {
    is_match(&RE_DATE, text)
}

pub fn is_phone(text: &str) -> bool {
    is_match(&RE_PHONE, text)
}

pub fn has_address_hint(text: &str) -> bool {
    is_match(&RE_ADDRESS_HINT, text)
}

/// Alphanumeric run of at least 8 characters mixing letters and digits
pub fn has_long_alnum_id(text: &str) -> bool {
    (*RE_LONG_ALNUM).as_ref().is_some_and(|re| {
        re.find_iter(text).any(|m| {
            let run = m.as_str();
            run.chars().any(|c| c.is_ascii_alphabetic()) && run.chars().any(|c| c.is_ascii_digit())
        })
    })
}

pub fn has_numeric_id(text: &str) -> bool {
    is_match(&RE_NUMERIC_ID, text)
}

fn single_token_card(text: &str) -> bool {
    (13..=16).contains(&digit_count(text)) && is_credit_card(text)
}

fn single_token_id(text: &str) -> bool {
    (4..=10).contains(&digit_count(text)) && is_match(&RE_DIGIT_RUN, text)
}

/// A contiguous run of tokens under evaluation by the sliding-window pass
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub tokens: &'a [Token],
    pub text: String,
}

impl<'a> Window<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();
        Self { tokens, text }
    }

    pub fn span(&self) -> usize {
        self.tokens.len()
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.trim())
    }
}

fn window_phone(window: &Window) -> bool {
    dialable_count(&window.text) >= 8 && is_phone(&window.text)
}

fn window_date(window: &Window) -> bool {
    is_date(&window.text)
}

fn window_address(window: &Window) -> bool {
    has_address_hint(&window.text)
}

fn window_name(window: &Window) -> bool {
    let long_enough = |t: &str| t.chars().count() >= 2;
    let title_cased = window
        .words()
        .all(|t| long_enough(t) && is_match(&RE_TITLE_WORD, t));
    let upper_cased = window
        .words()
        .all(|t| long_enough(t) && is_match(&RE_UPPER_WORD, t));
    let name_like = window.span() >= 2
        && window.words().all(|t| {
            long_enough(t) && is_match(&RE_ALPHA_WORD, t) && !t.chars().any(|c| c.is_ascii_digit())
        });
    title_cased || upper_cased || name_like
}

fn window_id(window: &Window) -> bool {
    has_long_alnum_id(&window.text)
}

fn window_date_range(window: &Window) -> bool {
    is_match(&RE_RANGE_CONNECTOR, &window.text) && is_date(&window.text)
}

fn line_name(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    (2..=5).contains(&words.len())
        && words.iter().all(|w| {
            w.chars().count() >= 2
                && is_match(&RE_LINE_NAME_WORD, w)
                && !w.chars().any(|c| c.is_ascii_digit())
        })
}

/// Rule applied to each token on its own
#[derive(Debug, Clone, Copy)]
pub struct TokenRule {
    pub name: &'static str,
    pub kind: DetectionType,
    pub matches: fn(&str) -> bool,
}

/// Rule applied to a window of `min_span..=max_span` tokens
#[derive(Debug, Clone, Copy)]
pub struct WindowRule {
    pub name: &'static str,
    pub kind: DetectionType,
    pub min_span: usize,
    pub max_span: usize,
    pub matches: fn(&Window) -> bool,
}

impl WindowRule {
    pub fn accepts_span(&self, span: usize) -> bool {
        span >= self.min_span && span <= self.max_span
    }
}

/// Where a line-level detection takes its confidence from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineConfidence {
    FromLine,
    Fixed(f64),
}

/// Rule applied to the full text of an OCR line
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    pub name: &'static str,
    pub kind: DetectionType,
    pub confidence: LineConfidence,
    pub matches: fn(&str) -> bool,
}

/// The three ordered rule tables used by the classifier
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub token_rules: Vec<TokenRule>,
    pub window_rules: Vec<WindowRule>,
    pub line_rules: Vec<LineRule>,
    pub max_window_span: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            token_rules: vec![
                TokenRule {
                    name: "email",
                    kind: DetectionType::Email,
                    matches: is_email,
                },
                TokenRule {
                    name: "credit_card",
                    kind: DetectionType::CreditCard,
                    matches: single_token_card,
                },
                TokenRule {
                    name: "numeric_id",
                    kind: DetectionType::Id,
                    matches: single_token_id,
                },
            ],
            window_rules: vec![
                WindowRule {
                    name: "phone",
                    kind: DetectionType::Phone,
                    min_span: 1,
                    max_span: 4,
                    matches: window_phone,
                },
                WindowRule {
                    name: "date",
                    kind: DetectionType::Date,
                    min_span: 1,
                    max_span: 5,
                    matches: window_date,
                },
                WindowRule {
                    name: "address",
                    kind: DetectionType::Address,
                    min_span: 2,
                    max_span: MAX_WINDOW_SPAN,
                    matches: window_address,
                },
                WindowRule {
                    name: "name",
                    kind: DetectionType::Name,
                    min_span: 2,
                    max_span: 4,
                    matches: window_name,
                },
                WindowRule {
                    name: "long_alnum_id",
                    kind: DetectionType::Id,
                    min_span: 1,
                    max_span: 3,
                    matches: window_id,
                },
                WindowRule {
                    name: "date_range",
                    kind: DetectionType::Date,
                    min_span: 5,
                    max_span: MAX_WINDOW_SPAN,
                    matches: window_date_range,
                },
            ],
            line_rules: vec![
                LineRule {
                    name: "email",
                    kind: DetectionType::Email,
                    confidence: LineConfidence::FromLine,
                    matches: is_email,
                },
                LineRule {
                    name: "credit_card",
                    kind: DetectionType::CreditCard,
                    confidence: LineConfidence::FromLine,
                    matches: is_credit_card,
                },
                LineRule {
                    name: "date",
                    kind: DetectionType::Date,
                    confidence: LineConfidence::FromLine,
                    matches: is_date,
                },
                LineRule {
                    name: "phone",
                    kind: DetectionType::Phone,
                    confidence: LineConfidence::FromLine,
                    matches: is_phone,
                },
                LineRule {
                    name: "address",
                    kind: DetectionType::Address,
                    confidence: LineConfidence::FromLine,
                    matches: has_address_hint,
                },
                LineRule {
                    name: "long_alnum_id",
                    kind: DetectionType::Id,
                    confidence: LineConfidence::FromLine,
                    matches: has_long_alnum_id,
                },
                LineRule {
                    name: "numeric_id",
                    kind: DetectionType::Id,
                    confidence: LineConfidence::FromLine,
                    matches: has_numeric_id,
                },
                LineRule {
                    name: "name_like_line",
                    kind: DetectionType::Name,
                    confidence: LineConfidence::Fixed(LINE_NAME_CONFIDENCE),
                    matches: line_name,
                },
            ],
            max_window_span: MAX_WINDOW_SPAN,
        }
    }
}

impl RuleSet {
    /// First single-token rule matching `text`
    pub fn first_token_match(&self, text: &str) -> Option<&TokenRule> {
        self.token_rules.iter().find(|rule| (rule.matches)(text))
    }

    /// First window rule whose span constraint admits the window and whose
    /// predicate holds
    pub fn first_window_match(&self, window: &Window) -> Option<&WindowRule> {
        self.window_rules
            .iter()
            .find(|rule| rule.accepts_span(window.span()) && (rule.matches)(window))
    }

    /// First line rule matching the full line text
    pub fn first_line_match(&self, text: &str) -> Option<&LineRule> {
        self.line_rules.iter().find(|rule| (rule.matches)(text))
    }
}
