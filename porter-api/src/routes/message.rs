//! Ticket Message REST API Routes
//!
//! Axum route handlers for threaded ticket messaging: appending messages
//! with resolved authorship, listing a thread, and marking messages read.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::PathTicketRef,
    types::{
        ListMessagesQuery, MarkMessagesReadRequest, MarkReadResponse, MessageEnvelope,
        MessageListEnvelope, Pagination, SendMessageRequest,
    },
    validation::PageBounds,
};
use porter_core::{MessageAuthor, TicketRequester};

/// Default and maximum page sizes for message listings.
const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for message routes.
#[derive(Clone)]
pub struct MessageState {
    pub db: DbClient,
}

impl MessageState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/support/tickets/{ref}/messages - Append a message
#[utoipa::path(
    post,
    path = "/api/v1/support/tickets/{ref}/messages",
    tag = "Messages",
    params(
        ("ref" = String, Path, description = "Ticket id or ticket number"),
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message appended successfully", body = MessageEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
)]
pub async fn send_message(
    State(state): State<Arc<MessageState>>,
    PathTicketRef(reference): PathTicketRef,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let body = req.message.as_deref().unwrap_or_default();
    if body.trim().is_empty() {
        return Err(ApiError::validation_failed("Message is required"));
    }

    let ticket = state
        .db
        .ticket_locate(&reference)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    // Authorship is reconciled against the parent ticket; a message with
    // no resolvable sender identifier is still accepted.
    let author = MessageAuthor::resolve(
        req.sender_type.as_deref(),
        req.sender_id,
        req.sender_name.as_deref(),
        req.user_name.as_deref(),
        req.user_id.as_deref(),
        TicketRequester {
            name: &ticket.user_name,
            id: ticket.user_id,
        },
    );

    let attachments = JsonValue::Array(req.attachments.clone().unwrap_or_default());
    let message = state
        .db
        .message_create(ticket.id, &author, body, &attachments)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageEnvelope::new(message))))
}

/// GET /api/v1/support/tickets/{ref}/messages - List a ticket's messages
#[utoipa::path(
    get,
    path = "/api/v1/support/tickets/{ref}/messages",
    tag = "Messages",
    params(
        ("ref" = String, Path, description = "Ticket id or ticket number"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("since" = Option<String>, Query, description = "Only messages created strictly after this RFC3339 instant"),
    ),
    responses(
        (status = 200, description = "Page of messages in creation order", body = MessageListEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
)]
pub async fn list_messages(
    State(state): State<Arc<MessageState>>,
    PathTicketRef(reference): PathTicketRef,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<impl IntoResponse> {
    let bounds = PageBounds::resolve(query.page, query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?;

    let ticket = state
        .db
        .ticket_locate(&reference)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    let messages = state
        .db
        .message_list(ticket.id, query.since, bounds.limit, bounds.offset)
        .await?;

    let total = messages.len() as i64;
    Ok(Json(MessageListEnvelope::new(
        messages,
        Pagination {
            page: bounds.page,
            limit: bounds.limit,
            total,
        },
    )))
}

/// POST /api/v1/support/tickets/{ref}/messages/read - Mark messages read
#[utoipa::path(
    post,
    path = "/api/v1/support/tickets/{ref}/messages/read",
    tag = "Messages",
    params(
        ("ref" = String, Path, description = "Ticket id or ticket number"),
    ),
    request_body = MarkMessagesReadRequest,
    responses(
        (status = 200, description = "Messages marked as read", body = MarkReadResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
)]
pub async fn mark_messages_read(
    State(state): State<Arc<MessageState>>,
    PathTicketRef(reference): PathTicketRef,
    Json(req): Json<MarkMessagesReadRequest>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state
        .db
        .ticket_locate(&reference)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    let updated = state
        .db
        .messages_mark_read(ticket.id, req.message_ids.as_deref())
        .await?;

    Ok(Json(MarkReadResponse::new(updated)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the message routes router, mounted under the ticket prefix.
pub fn create_router(db: DbClient) -> axum::Router {
    let state = Arc::new(MessageState::new(db));

    axum::Router::new()
        .route(
            "/:reference/messages",
            axum::routing::post(send_message).get(list_messages),
        )
        .route(
            "/:reference/messages/read",
            axum::routing::post(mark_messages_read),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_body_is_rejected() {
        for raw in [None, Some(""), Some("   ")] {
            let body = raw.unwrap_or_default();
            assert!(body.trim().is_empty());
        }
        assert!(!"  hello ".trim().is_empty());
    }

    #[test]
    fn test_attachments_default_to_empty_array() {
        let req = SendMessageRequest::default();
        let attachments = JsonValue::Array(req.attachments.unwrap_or_default());
        assert_eq!(attachments, serde_json::json!([]));
    }

    #[test]
    fn test_mark_read_request_shapes() {
        let explicit: MarkMessagesReadRequest =
            serde_json::from_str(r#"{"message_ids": ["550e8400-e29b-41d4-a716-446655440000"]}"#)
                .unwrap();
        assert_eq!(explicit.message_ids.map(|ids| ids.len()), Some(1));

        let bulk: MarkMessagesReadRequest = serde_json::from_str("{}").unwrap();
        assert!(bulk.message_ids.is_none());
    }
}
