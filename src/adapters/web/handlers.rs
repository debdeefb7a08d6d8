//! HTTP request handlers for the web adapter.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::error::ScanError;

use super::{AppState, WebError};

/// GET /macd: the latest published snapshot, unmodified.
pub async fn macd(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let bytes = tokio::fs::read(&state.snapshot_path)
        .await
        .map_err(ScanError::from)?;

    // Refuse to serve a document that does not parse.
    serde_json::from_slice::<serde::de::IgnoredAny>(&bytes).map_err(ScanError::from)?;

    tracing::debug!(path = %state.snapshot_path.display(), bytes = bytes.len(), "serving snapshot");
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
