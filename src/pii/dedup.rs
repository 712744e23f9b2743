// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Overlap-based deduplication of raw detection candidates

use super::types::Detection;

/// Overlap ratio above which two same-type detections are the same span
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.6;

/// Fraction of `candidate`'s area covered by `existing`
///
/// Zero-area boxes never overlap anything.
pub fn overlap_ratio(existing: &Detection, candidate: &Detection) -> f64 {
    let existing_area = existing.bbox.area();
    let candidate_area = candidate.bbox.area();
    if existing_area <= 0.0 || candidate_area <= 0.0 {
        return 0.0;
    }
    existing.bbox.intersection_area(&candidate.bbox) / candidate_area
}

/// Collapse overlapping same-type candidates
///
/// Candidates are visited in order. A candidate whose overlap ratio with an
/// already accepted detection of the same type exceeds `threshold` replaces
/// that detection in place if its confidence is strictly higher, and is
/// dropped otherwise. Detections of different types never merge.
pub fn deduplicate(candidates: Vec<Detection>, threshold: f64) -> Vec<Detection> {
    let mut unique: Vec<Detection> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let duplicate_of = unique.iter().position(|existing| {
            existing.kind == candidate.kind && overlap_ratio(existing, &candidate) > threshold
        });

        match duplicate_of {
            None => unique.push(candidate),
            Some(index) => {
                if candidate.confidence > unique[index].confidence {
                    unique[index] = candidate;
                }
            }
        }
    }

    unique
}
