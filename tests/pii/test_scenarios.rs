// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end classifier scenarios over hand-built OCR rows

use fabstir_pii_redactor::pii::{
    classify, deduplicate, CornerBox, Detection, DetectionType, Line, PiiClassifier, Token,
    DEFAULT_OVERLAP_THRESHOLD,
};

/// Tokens laid out left to right on one row, 50px wide with 10px gaps
fn row(words: &[&str]) -> Vec<Token> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let x = 10.0 + i as f64 * 60.0;
            Token::new(*w, CornerBox::new(x, 100.0, x + 50.0, 120.0), 85.0)
        })
        .collect()
}

fn of_kind(detections: &[Detection], kind: DetectionType) -> Vec<&Detection> {
    detections.iter().filter(|d| d.kind == kind).collect()
}

#[test]
fn test_single_email_token() {
    let detections = classify(&row(&["john.doe@example.com"]), &[]);

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].kind, DetectionType::Email);
    assert_eq!(detections[0].text, "john.doe@example.com");
    assert_eq!(detections[0].confidence, 85.0);
}

#[test]
fn test_grouped_card_number_on_one_line() {
    let tokens = row(&["4111", "1111", "1111", "1111"]);
    let line = Line::from_tokens(&tokens).unwrap();
    let detections = classify(&tokens, &[line]);

    let cards = of_kind(&detections, DetectionType::CreditCard);
    assert_eq!(cards.len(), 1);
    let card = cards[0];
    assert_eq!(card.text, "4111 1111 1111 1111");
    // covers the union of all four token boxes
    assert_eq!(card.bbox.left, 10.0);
    assert_eq!(card.bbox.right(), 240.0);
    assert_eq!(card.bbox.top, 100.0);
    assert_eq!(card.bbox.height, 20.0);
}

#[test]
fn test_street_address() {
    let detections = classify(&row(&["123", "Main", "Street"]), &[]);

    assert_eq!(detections.len(), 1);
    let address = &detections[0];
    assert_eq!(address.kind, DetectionType::Address);
    assert_eq!(address.text, "123 Main Street");
    assert_eq!(address.bbox.left, 10.0);
    assert_eq!(address.bbox.width, 170.0);
}

#[test]
fn test_empty_input() {
    assert!(classify(&[], &[]).is_empty());
}

#[test]
fn test_overlapping_names_keep_higher_confidence() {
    let make = |confidence: f64, x: f64| Detection {
        id: uuid::Uuid::new_v4(),
        kind: DetectionType::Name,
        text: "Jane Doe".to_string(),
        confidence,
        bbox: fabstir_pii_redactor::pii::BoundingBox::new(x, 0.0, 100.0, 20.0),
    };
    let low = make(80.0, 0.0);
    // 90 of the candidate's 100 px overlap the first box
    let high = make(90.0, 10.0);
    let high_id = high.id;

    let result = deduplicate(vec![low, high], DEFAULT_OVERLAP_THRESHOLD);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, high_id);
    assert_eq!(result[0].confidence, 90.0);
}

#[test]
fn test_short_window_preempts_longer_match() {
    // "Jane Doe" satisfies the name rule at span 2 before "Jane Doe Street"
    // is tried as an address; the address is only found from "Doe".
    let detections = classify(&row(&["Jane", "Doe", "Street"]), &[]);

    let names = of_kind(&detections, DetectionType::Name);
    let addresses = of_kind(&detections, DetectionType::Address);
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].text, "Jane Doe");
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].text, "Doe Street");
    assert_eq!(addresses[0].bbox.left, 70.0);
}

#[test]
fn test_phone_number_across_tokens() {
    let detections = classify(&row(&["Tel:", "+61", "412", "345", "678"]), &[]);
    let phones = of_kind(&detections, DetectionType::Phone);

    assert!(!phones.is_empty());
    assert!(phones.iter().any(|p| p.text.contains("+61 412 345")));
}

#[test]
fn test_written_date() {
    let detections = classify(&row(&["Issued", "March", "3rd,", "2021"]), &[]);
    let dates = of_kind(&detections, DetectionType::Date);

    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0].text, "March 3rd, 2021");
}

#[test]
fn test_line_fallback_name_confidence() {
    let line = Line::new(
        "Certificate Holder",
        CornerBox::new(0.0, 0.0, 400.0, 40.0),
        55.0,
    );
    let detections = PiiClassifier::default().classify(&[], &[line]);

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].kind, DetectionType::Name);
    assert_eq!(detections[0].confidence, 88.0);
}

#[test]
fn test_detections_serialize_with_type_key() {
    let detections = classify(&row(&["jane@corp.io"]), &[]);
    let json = serde_json::to_value(&detections).unwrap();

    assert_eq!(json[0]["type"], "email");
    assert_eq!(json[0]["bbox"]["left"], 10.0);
    assert!(json[0]["id"].as_str().is_some());
}

#[test]
fn test_date_range_sentence() {
    let detections = classify(
        &row(&["from", "Mar", "15th", "2015", "to", "Nov", "10th", "2016"]),
        &[],
    );

    let found: Vec<(DetectionType, &str)> = detections
        .iter()
        .map(|d| (d.kind, d.text.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (DetectionType::Id, "2015"),
            (DetectionType::Id, "2016"),
            (DetectionType::Name, "from Mar"),
            (DetectionType::Date, "Mar 15th 2015"),
            (DetectionType::Date, "15th 2015 to Nov 10th 2016"),
            (DetectionType::Name, "to Nov"),
        ]
    );

    // "Mar" already started a shorter date window, so the range begins at "15th"
    let range = &detections[4];
    assert_eq!(range.bbox.left, 130.0);
    assert_eq!(range.bbox.right(), 480.0);
}
