//! Web server adapter: republishes the snapshot file over HTTP.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::domain::error::ScanError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:10015";

pub struct AppState {
    pub snapshot_path: PathBuf,
}

impl AppState {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let snapshot_path = config
            .get_string("web", "snapshot")
            .or_else(|| config.get_string("scan", "output"))
            .unwrap_or_else(|| crate::domain::scan_config::DEFAULT_OUTPUT.to_string());
        Self {
            snapshot_path: PathBuf::from(snapshot_path),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/macd", get(handlers::macd))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(listen: &str, state: AppState) -> Result<(), ScanError> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(
        listen = %listen,
        snapshot = %state.snapshot_path.display(),
        "serving snapshot"
    );
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
