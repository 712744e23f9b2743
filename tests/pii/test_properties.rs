// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Property tests for deduplication and rescaling

use fabstir_pii_redactor::pii::{
    deduplicate, rescale_with, BoundingBox, Detection, DetectionType, ImageSize, ScaleFactors,
    DEFAULT_OVERLAP_THRESHOLD,
};
use proptest::prelude::*;
use uuid::Uuid;

fn detection(kind: DetectionType, bbox: BoundingBox, confidence: f64) -> Detection {
    Detection {
        id: Uuid::new_v4(),
        kind,
        text: kind.to_string(),
        confidence,
        bbox,
    }
}

proptest! {
    /// Same-size boxes shifted by at most a tenth of their extent overlap by
    /// more than 0.81 pairwise and collapse to the most confident one.
    #[test]
    fn prop_dedup_converges_to_most_confident(
        left in 0u32..1000,
        top in 0u32..1000,
        width in 20u32..400,
        height in 10u32..100,
        members in prop::collection::vec((0.0f64..=0.1, 0.0f64..=0.1, 0u32..=100), 1..12),
    ) {
        let candidates: Vec<Detection> = members
            .iter()
            .map(|(fx, fy, conf)| {
                let bbox = BoundingBox::new(
                    left as f64 + fx * width as f64,
                    top as f64 + fy * height as f64,
                    width as f64,
                    height as f64,
                );
                detection(DetectionType::Phone, bbox, *conf as f64)
            })
            .collect();

        let best = candidates
            .iter()
            .fold(None::<&Detection>, |best, d| match best {
                Some(b) if b.confidence >= d.confidence => Some(b),
                _ => Some(d),
            })
            .map(|d| d.id);

        let result = deduplicate(candidates, DEFAULT_OVERLAP_THRESHOLD);
        prop_assert_eq!(result.len(), 1);
        prop_assert_eq!(Some(result[0].id), best);
    }

    /// Two same-type boxes overlapping by at most 60% both survive
    #[test]
    fn prop_low_overlap_survives(
        width in 10u32..500,
        height in 5u32..100,
        extra in 0u32..600,
        first_conf in 0u32..=100,
        second_conf in 0u32..=100,
    ) {
        let w = width as f64;
        let shift = (0.4 * w).ceil() + extra as f64;
        let a = detection(DetectionType::Name, BoundingBox::new(0.0, 0.0, w, height as f64), first_conf as f64);
        let b = detection(DetectionType::Name, BoundingBox::new(shift, 0.0, w, height as f64), second_conf as f64);

        let result = deduplicate(vec![a, b], DEFAULT_OVERLAP_THRESHOLD);
        prop_assert_eq!(result.len(), 2);
    }

    /// Scaling then applying the inverse factors restores every coordinate
    #[test]
    fn prop_rescale_inverse_round_trip(
        ow in 1u32..5000, oh in 1u32..5000,
        pw in 1u32..5000, ph in 1u32..5000,
        left in 0.0f64..4000.0, top in 0.0f64..4000.0,
        width in 1.0f64..2000.0, height in 1.0f64..2000.0,
    ) {
        let factors = ScaleFactors::between(Some(ImageSize::new(ow, oh)), Some(ImageSize::new(pw, ph)));
        let original = detection(DetectionType::Date, BoundingBox::new(left, top, width, height), 85.0);

        let there = rescale_with(vec![original.clone()], factors);
        let back = rescale_with(there, factors.inverse());
        let bbox = back[0].bbox;

        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * b.abs().max(1.0);
        prop_assert!(close(bbox.left, left));
        prop_assert!(close(bbox.top, top));
        prop_assert!(close(bbox.width, width));
        prop_assert!(close(bbox.height, height));
        prop_assert_eq!(back[0].id, original.id);
    }
}
