//! API Routes
//!
//! Configures the Axum router with all companion endpoints and the fetch
//! interception fallback.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::imaging::MAX_UPLOAD_BYTES;

use super::events::events_handler;
use super::fetch::fetch_handler;
use super::handlers::{
    add_discovery_handler, delete_discovery_handler, delete_favorite_handler,
    get_position_handler, health_handler, identify_handler, list_discoveries_handler,
    list_favorites_handler, put_position_handler, results_handler, search_handler,
    toggle_favorite_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET/PUT /api/position` - Last known position
/// - `GET /api/results` - Last search results
/// - `POST /api/search` - Search around a position
/// - `GET /api/favorites`, `POST /api/favorites/toggle`, `DELETE /api/favorites/:id`
/// - `GET/POST /api/discoveries`, `DELETE /api/discoveries/:id`
/// - `POST /api/identify` - Multipart photo identification
///
/// Photo-carrying routes accept bodies up to `MAX_UPLOAD_BYTES`.
/// - `POST /api/events` - Structured list actions
/// - `GET /health` - Health check endpoint
/// - anything else - fetch interception
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/position", get(get_position_handler).put(put_position_handler))
        .route("/api/results", get(results_handler))
        .route("/api/search", post(search_handler))
        .route("/api/favorites", get(list_favorites_handler))
        .route("/api/favorites/toggle", post(toggle_favorite_handler))
        .route("/api/favorites/:id", delete(delete_favorite_handler))
        .route(
            "/api/discoveries",
            get(list_discoveries_handler)
                .post(add_discovery_handler)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/discoveries/:id", delete(delete_discovery_handler))
        .route(
            "/api/identify",
            post(identify_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/events", post(events_handler))
        .route("/health", get(health_handler))
        .fallback(fetch_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
