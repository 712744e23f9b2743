// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Health endpoint and routing tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use fabstir_pii_redactor::api::{build_router, AppState, HealthResponse};
use fabstir_pii_redactor::pii::OcrData;
use fabstir_pii_redactor::vision::{OcrEngine, OcrError, OcrWorker};
use fabstir_pii_redactor::RedactorConfig;
use std::sync::Arc;
use tower::ServiceExt;

struct SilentEngine;

struct SilentWorker;

impl OcrEngine for SilentEngine {
    fn name(&self) -> &str {
        "silent"
    }

    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, OcrError> {
        Ok(Box::new(SilentWorker))
    }
}

impl OcrWorker for SilentWorker {
    fn recognize(&mut self, _image: &[u8]) -> Result<OcrData, OcrError> {
        Ok(OcrData::default())
    }

    fn terminate(&mut self) {}
}

fn router() -> axum::Router {
    build_router(AppState::new(&RedactorConfig::default(), Arc::new(SilentEngine)))
}

#[cfg(test)]
mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_engine() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.ocr_engine, "silent");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_uses_camel_case() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("ocrEngine").is_some());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router()
            .oneshot(Request::get("/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redact_rejects_get() {
        let response = router()
            .oneshot(Request::get("/v1/redact").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
