// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/redact and /v1/redact/base64 tests
//!
//! The fake engine reports one email spanning the left half of whatever image
//! it is given, so the redacted output has a known black region.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fabstir_pii_redactor::api::{build_router, AppState, ErrorResponse, RedactResponse};
use fabstir_pii_redactor::pii::{DetectionType, OcrData, RawBox, RawToken};
use fabstir_pii_redactor::vision::{
    decode_base64_payload, decode_image_bytes, encode_png, OcrEngine, OcrError, OcrWorker,
};
use fabstir_pii_redactor::RedactorConfig;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----redactor-test-boundary";
const TARGET_WIDTH: u32 = 200;

struct HalfPageEmailEngine;

struct HalfPageEmailWorker;

impl OcrEngine for HalfPageEmailEngine {
    fn name(&self) -> &str {
        "half-page"
    }

    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, OcrError> {
        Ok(Box::new(HalfPageEmailWorker))
    }
}

impl OcrWorker for HalfPageEmailWorker {
    fn recognize(&mut self, _image: &[u8]) -> Result<OcrData, OcrError> {
        let half = f64::from(TARGET_WIDTH) / 2.0;
        Ok(OcrData {
            text: "jane@corp.io".to_string(),
            words: vec![RawToken {
                text: Some("jane@corp.io".to_string()),
                bbox: Some(RawBox::corners(0.0, 0.0, half, half / 2.0)),
                confidence: Some(96.0),
            }],
            lines: Vec::new(),
        })
    }

    fn terminate(&mut self) {}
}

fn router_with(max_upload_bytes: usize) -> Router {
    let config = RedactorConfig {
        max_upload_bytes,
        ocr_target_width: TARGET_WIDTH,
        ..RedactorConfig::default()
    };
    build_router(AppState::new(&config, Arc::new(HalfPageEmailEngine)))
}

fn white_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    encode_png(&DynamicImage::ImageRgba8(img)).unwrap()
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/v1/redact")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/v1/redact/base64")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn assert_left_half_redacted(response: &RedactResponse, width: u32, height: u32) {
    let png = decode_base64_payload(&response.redacted_image).unwrap();
    let (image, _) = decode_image_bytes(&png).unwrap();
    let image = image.to_rgba8();
    assert_eq!(image.dimensions(), (width, height));
    assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    assert_eq!(*image.get_pixel(width - 1, height - 1), Rgba([255, 255, 255, 255]));
}

#[cfg(test)]
mod redact_tests {
    use super::*;

    #[tokio::test]
    async fn test_multipart_upload_is_redacted() {
        let png = white_png(100, 50);
        let (status, body) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("image", "image/png", &png)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: RedactResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.extracted_text, "jane@corp.io");
        assert_eq!((response.original_width, response.original_height), (100, 50));
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.detections[0].kind, DetectionType::Email);
        assert_eq!(response.detections[0].bbox.width, 50.0);
        assert!(response.preview_image.starts_with("data:image/png;base64,"));
        assert!(response.redacted_image.starts_with("data:image/png;base64,"));
        assert_left_half_redacted(&response, 100, 50);
    }

    #[tokio::test]
    async fn test_response_field_names() {
        let png = white_png(40, 20);
        let (_, body) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("image", "image/png", &png)),
        )
        .await;

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        for key in [
            "extractedText",
            "detections",
            "previewImage",
            "redactedImage",
            "processingTimeMs",
            "originalWidth",
            "originalHeight",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_missing_image_field_is_400() {
        let png = white_png(10, 10);
        let (status, body) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("file", "image/png", &png)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error_type, "validation_error");
    }

    #[tokio::test]
    async fn test_unsupported_mime_is_415() {
        let (status, body) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("image", "application/pdf", b"%PDF-1.7 ...")),
        )
        .await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error_type, "unsupported_media_type");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let png = white_png(64, 64);
        let limit = png.len() - 1;
        let (status, body) = send(
            router_with(limit),
            multipart_request(multipart_body("image", "image/png", &png)),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error_type, "payload_too_large");
    }

    #[tokio::test]
    async fn test_tall_narrow_image_is_400() {
        let strip = encode_png(&DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 20_000, Luma([255]))))
            .unwrap();
        let (status, body) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("image", "image/png", &strip)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error_type, "validation_error");
        assert!(error.message.contains("20000"));
    }

    #[tokio::test]
    async fn test_corrupt_png_is_400() {
        let mut png = white_png(16, 16);
        png.truncate(24);
        let (status, _) = send(
            router_with(1024 * 1024),
            multipart_request(multipart_body("image", "image/png", &png)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_base64_data_url() {
        let png = white_png(60, 30);
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let (status, body) = send(router_with(1024 * 1024), json_request(json!({ "image": data_url }))).await;

        assert_eq!(status, StatusCode::OK);
        let response: RedactResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.detections.len(), 1);
        assert_left_half_redacted(&response, 60, 30);
    }

    #[tokio::test]
    async fn test_base64_plain_payload_with_mime() {
        let png = white_png(30, 30);
        let (status, body) = send(
            router_with(1024 * 1024),
            json_request(json!({ "image": STANDARD.encode(&png), "mimeType": "image/png" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: RedactResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.preview_image, format!("data:image/png;base64,{}", STANDARD.encode(&png)));
    }

    #[tokio::test]
    async fn test_base64_missing_image_is_400() {
        let (status, _) = send(router_with(1024 * 1024), json_request(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_base64_invalid_payload_is_400() {
        let (status, _) = send(
            router_with(1024 * 1024),
            json_request(json!({ "image": "!!!not base64!!!", "mimeType": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_base64_bad_mime_is_415() {
        let (status, _) = send(
            router_with(1024 * 1024),
            json_request(json!({ "image": STANDARD.encode(b"hello"), "mimeType": "text/plain" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
