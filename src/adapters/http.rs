//! HTTP surface: `GET /services` plus the landing page bundle.

use crate::core::discovery::DiscoveryService;
use crate::utils::error::{DiscoveryError, Result};
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const LANDING_PAGE: &str = "landing_page.html";

#[derive(Clone)]
pub struct AppState {
    discovery: Arc<DiscoveryService>,
    static_dir: Arc<PathBuf>,
}

pub fn router(discovery: Arc<DiscoveryService>, static_dir: impl Into<PathBuf>) -> Router {
    let state = AppState {
        discovery,
        static_dir: Arc::new(static_dir.into()),
    };

    Router::new()
        .route("/", get(landing_page))
        .route("/services", get(list_services))
        .fallback(static_asset)
        .with_state(state)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn list_services(State(state): State<AppState>) -> Response {
    match state.discovery.discover().await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for DiscoveryError {
    fn into_response(self) -> Response {
        tracing::error!(kind = ?self.kind(), "Request failed: {}", self);

        // Only the fixed per-kind text leaves the process.
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.user_friendly_message(),
        )
            .into_response()
    }
}

async fn landing_page(State(state): State<AppState>) -> Response {
    serve_file(&state.static_dir, Path::new(LANDING_PAGE)).await
}

async fn static_asset(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match sanitize(uri.path()) {
        Some(relative) => serve_file(&state.static_dir, &relative).await,
        None => not_found(),
    }
}

/// Maps a request path onto a relative file path, refusing anything that could escape the root.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }

    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| relative.to_path_buf())
}

async fn serve_file(root: &Path, relative: &Path) -> Response {
    let path = root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(e) => {
            tracing::debug!("Static file {:?} unavailable: {}", path, e);
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
