//! # HTTP Editor Backend
//!
//! JSON API over one shared editor session: upload a template and CSV data,
//! drive the pointer state machine, fetch preview PNGs, and run batch
//! exports in the background.
//!
//! ## Usage
//!
//! ```bash
//! fieldpress serve --listen 0.0.0.0:8080
//! ```
//!
//! Errors come back as `{"success": false, "error": "..."}` with a 4xx or
//! 5xx status.

mod handlers;
mod state;

pub use state::{AppState, ExportOutcome, ExportSlot, RunningExport, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::FieldpressError;

/// Upload limit for templates and data files.
const UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Build the API router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Catalog and uploads
        .route("/api/fonts", get(handlers::uploads::fonts))
        .route(
            "/api/template",
            post(handlers::uploads::template).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route(
            "/api/data",
            post(handlers::uploads::data).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        // Editor session
        .route("/api/editor", get(handlers::editor::snapshot))
        .route("/api/editor/pointer", post(handlers::editor::pointer))
        .route("/api/editor/wheel", post(handlers::editor::wheel))
        .route("/api/editor/name", post(handlers::editor::name))
        .route("/api/editor/zoom", post(handlers::editor::zoom))
        .route("/api/editor/tool", post(handlers::editor::tool))
        .route("/api/editor/preview-row", post(handlers::editor::preview_row))
        .route(
            "/api/fields/:index",
            put(handlers::editor::update_field).delete(handlers::editor::delete_field),
        )
        .route("/api/fields/:index/binding", put(handlers::editor::bind_field))
        .route("/api/naming", put(handlers::editor::naming))
        .route(
            "/api/layout",
            get(handlers::editor::get_layout).put(handlers::editor::put_layout),
        )
        .route("/api/preview", get(handlers::editor::preview))
        // Batch export
        .route("/api/export", post(handlers::export::start))
        .route("/api/export/status", get(handlers::export::status))
        .route("/api/export/cancel", post(handlers::export::cancel))
        .route("/api/export/download", get(handlers::export::download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fieldpress::config::Config;
/// use fieldpress::server::{serve, AppState, ServerConfig};
/// use fieldpress::text::FontBook;
///
/// # async fn example() -> Result<(), fieldpress::FieldpressError> {
/// let state = AppState::new(Config::default(), Arc::new(FontBook::builtin()));
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
/// };
///
/// serve(config, state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, state: AppState) -> Result<(), FieldpressError> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            FieldpressError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(addr = %config.listen_addr, "fieldpress editor backend listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| FieldpressError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
