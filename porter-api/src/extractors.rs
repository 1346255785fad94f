//! Custom path extractors.
//!
//! Provides `PathTicketRef`, which turns the `:ref` path segment into a
//! [`TicketRef`] so handlers never re-implement the "is it a native id or
//! a ticket number" decision.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use porter_core::TicketRef;
use serde_json::json;

/// Extractor for ticket references from path parameters.
///
/// A reference is either a native ticket identifier (dashed-UUID form) or
/// a human-facing ticket number; classification happens here, once, so
/// every route resolves references identically.
#[derive(Debug, Clone)]
pub struct PathTicketRef(pub TicketRef);

/// Error returned when ticket reference extraction fails.
#[derive(Debug)]
pub struct TicketRefError {
    pub path_param: String,
    pub message: String,
}

impl std::fmt::Display for TicketRefError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid ticket reference '{}': {}",
            self.path_param, self.message
        )
    }
}

impl std::error::Error for TicketRefError {}

impl IntoResponse for TicketRefError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.to_string(),
            "path_param": self.path_param,
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PathTicketRef
where
    S: Send + Sync,
{
    type Rejection = TicketRefError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|e| TicketRefError {
                    path_param: parts.uri.path().to_string(),
                    message: format!("Failed to extract reference from path: {}", e),
                })?;

        let reference = TicketRef::parse(&raw).ok_or_else(|| TicketRefError {
            path_param: raw.clone(),
            message: "Ticket reference must not be empty".to_string(),
        })?;

        Ok(PathTicketRef(reference))
    }
}
