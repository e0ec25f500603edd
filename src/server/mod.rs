//! # HTTP Server for Label Templates
//!
//! JSON API over in-memory template and product stores, with PNG previews
//! and vector display lists rendered on demand.
//!
//! ## Usage
//!
//! ```bash
//! etiqueta serve --listen 0.0.0.0:8080 --font DejaVuSans.ttf
//! ```
//!
//! ## Routes
//!
//! | Method | Path | |
//! |--------|------|--|
//! | GET, POST | `/api/templates` | list / create |
//! | GET, PUT, DELETE | `/api/templates/:id` | |
//! | POST | `/api/templates/:id/preview` | PNG |
//! | POST | `/api/templates/:id/commands` | display list JSON |
//! | GET, POST | `/api/products` | list / create |
//! | GET, PUT, DELETE | `/api/products/:id` | |
//! | GET | `/api/element-types` | |
//! | POST | `/api/fit` | fit text into a box |
//! | POST | `/api/images` | multipart upload |
//! | GET | `/api/images/:id` | uploaded image as PNG |

mod handlers;
mod state;

pub use state::{AppState, ProductRecord, ServerConfig, TemplateRecord};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::EtiquetaError;

/// Upload size limit for images.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Templates
        .route("/api/templates", get(handlers::templates::list).post(handlers::templates::create))
        .route(
            "/api/templates/:id",
            get(handlers::templates::get)
                .put(handlers::templates::update)
                .delete(handlers::templates::delete),
        )
        .route("/api/templates/:id/preview", post(handlers::render::preview))
        .route("/api/templates/:id/commands", post(handlers::render::commands))
        // Products
        .route("/api/products", get(handlers::products::list).post(handlers::products::create))
        .route(
            "/api/products/:id",
            get(handlers::products::get)
                .put(handlers::products::update)
                .delete(handlers::products::delete),
        )
        // Layout helpers
        .route("/api/element-types", get(handlers::render::types))
        .route("/api/fit", post(handlers::render::fit_text))
        // Images
        .route(
            "/api/images",
            post(handlers::images::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/images/:id", get(handlers::images::get))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use etiqueta::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), etiqueta::EtiquetaError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), EtiquetaError> {
    let state = Arc::new(AppState::new(config.clone())?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| EtiquetaError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    info!(addr = %config.listen_addr, "etiqueta server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| EtiquetaError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
