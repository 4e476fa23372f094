// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! HTTP front for analysis requests

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::{Error, ErrorReply};
use crate::supervisor::AnalysisService;
use crate::worker::AnalysisRequest;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn AnalysisService>,
}

/// Body of `POST /api/analyze`; the URL is checked by hand so a missing
/// field gets the same answer as an empty one
#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub url: Option<String>,
}

/// Create the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(handle_analyze))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Rejected analyze request body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorReply::new(format!("Invalid request body: {}", rejection.body_text()))),
            )
                .into_response();
        }
    };

    let url = match body.url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return (StatusCode::BAD_REQUEST, Json(ErrorReply::new("URL is required"))).into_response();
        }
    };

    tracing::info!("Analyzing {} for accessibility issues", url);

    match state.analyzer.analyze(AnalysisRequest::new(url)).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::error!("Analysis failed: {}", e);
            (status_for(&e), Json(ErrorReply::from(&e))).into_response()
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
