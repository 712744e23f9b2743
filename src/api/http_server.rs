// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::detect::detect_handler;
use super::redact::{redact_base64_handler, redact_upload_handler};
use crate::config::RedactorConfig;
use crate::pipeline::{RedactionPipeline, RedactionService};
use crate::vision::ocr::OcrEngine;

/// Room for multipart framing and JSON around the image payload
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: RedactionService,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build the redaction service for `engine` from `config`
    pub fn new(config: &RedactorConfig, engine: Arc<dyn OcrEngine>) -> Self {
        let pipeline = RedactionPipeline::new(engine)
            .with_classifier(config.classifier.clone())
            .with_target_width(config.ocr_target_width);
        Self {
            service: RedactionService::new(
                pipeline,
                config.max_concurrent_ocr,
                config.request_timeout,
            ),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Request body limit; base64 bodies are a third larger than the image
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 4 + BODY_OVERHEAD_BYTES
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ocr_engine: String,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/redact", post(redact_upload_handler))
        .route("/v1/redact/base64", post(redact_base64_handler))
        .route("/v1/detect", post(detect_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: RedactorConfig, engine: Arc<dyn OcrEngine>) -> anyhow::Result<()> {
    let addr = config.listen_addr.parse::<SocketAddr>()?;
    let app = build_router(AppState::new(&config, engine));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        ocr_engine: state.service.pipeline().engine_name().to_string(),
    })
}
