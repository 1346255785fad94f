//! REST API routes, one module per resource.
//!
//! - Support tickets (creation, ownership-scoped listing, lookup, update)
//! - Ticket messages (threaded messaging, read tracking)
//! - Habit compliance (daily upsert, aggregate tracker view)
//! - Health probe
//!
//! Assembly adds the CORS and trace layers and a JSON 404 fallback so
//! unknown paths answer in the same envelope as everything else.

pub mod habit;
pub mod health;
pub mod message;
pub mod ticket;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::openapi::ApiDoc;

// Re-export route creation functions for convenience
pub use habit::create_router as habit_router;
pub use health::create_router as health_router;
pub use message::create_router as message_router;
pub use ticket::create_router as ticket_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// FALLBACK
// ============================================================================

/// JSON 404 for unknown routes, matching the error envelope shape.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": "Route not found",
            "path": uri.path(),
        })),
    )
}

// ============================================================================
// CORS
// ============================================================================

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if !config.cors_is_restricted() {
        // Credentials cannot be combined with a wildcard origin.
        tracing::info!("CORS: no origin list configured, allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: restricting to configured origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Create the full API router with all routes and layers.
pub fn create_api_router(db: DbClient, config: &ApiConfig) -> Router {
    // Ticket and message routes share the ticket path prefix.
    let support = Router::new()
        .merge(ticket::create_router(db.clone()))
        .merge(message::create_router(db.clone()));

    Router::new()
        .merge(health::create_router())
        .nest("/api/v1/support/tickets", support)
        .nest("/api/v1/habits", habit::create_router(db))
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found)
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
