//! Ticket REST API Routes
//!
//! Axum route handlers for support ticket operations. Caller identity is
//! asserted by the client and classified once; every listing is scoped to
//! exactly one identity before any query reaches storage.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures_util::future::try_join_all;
use std::sync::Arc;

use crate::{
    db::{DbClient, TicketCreateParams, TicketUpdateParams},
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::PathTicketRef,
    types::{
        CreateTicketRequest, ListTicketsQuery, Pagination, TicketDetailEnvelope, TicketEnvelope,
        TicketListEnvelope, TicketResponse, UpdateTicketRequest,
    },
    validation::{HasUpdates, PageBounds, ValidateNonEmpty},
};
use porter_core::{CallerIdentity, RequesterIdentity, TicketPriority, TicketStatus};

/// Default and maximum page sizes for ticket listings.
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for ticket routes.
#[derive(Clone)]
pub struct TicketState {
    pub db: DbClient,
}

impl TicketState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Classify the asserted caller identity or fail with 401. Runs before
/// any storage access on identity-scoped endpoints.
fn require_caller(user_id: Option<&str>, action: &str) -> ApiResult<CallerIdentity> {
    user_id.and_then(CallerIdentity::classify).ok_or_else(|| {
        ApiError::authentication_required(format!(
            "Authentication required. Please log in to {}.",
            action
        ))
    })
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/support/tickets - Create a ticket
#[utoipa::path(
    post,
    path = "/api/v1/support/tickets",
    tag = "Tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created successfully", body = TicketEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Caller identity missing", body = ErrorResponse),
    ),
)]
pub async fn create_ticket(
    State(state): State<Arc<TicketState>>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller = require_caller(req.user_id.as_deref(), "create a ticket")?;

    let required = [
        ("user_name", &req.user_name),
        ("user_email", &req.user_email),
        ("user_phone", &req.user_phone),
        ("subject", &req.subject),
        ("description", &req.description),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(name, value)| value.validate_non_empty(name).is_err())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::validation_failed(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let priority = match req.priority.as_deref() {
        Some(raw) => raw
            .parse::<TicketPriority>()
            .map_err(ApiError::validation_failed)?,
        None => TicketPriority::default(),
    };

    let requester = RequesterIdentity::from_caller(&caller);
    let ticket = state
        .db
        .ticket_create(&TicketCreateParams {
            requester: &requester,
            user_name: req.user_name.as_deref().unwrap_or_default(),
            user_email: req.user_email.as_deref().unwrap_or_default(),
            user_phone: req.user_phone.as_deref().unwrap_or_default(),
            subject: req.subject.as_deref().unwrap_or_default(),
            description: req.description.as_deref().unwrap_or_default(),
            category: req.category.as_deref().filter(|c| !c.trim().is_empty()),
            priority,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TicketEnvelope::new(ticket))))
}

/// GET /api/v1/support/tickets - List the caller's tickets
#[utoipa::path(
    get,
    path = "/api/v1/support/tickets",
    tag = "Tickets",
    params(
        ("user_id" = Option<String>, Query, description = "Caller identity (native id or foreign identity string)"),
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Page of the caller's tickets", body = TicketListEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Caller identity missing", body = ErrorResponse),
    ),
)]
pub async fn list_tickets(
    State(state): State<Arc<TicketState>>,
    Query(query): Query<ListTicketsQuery>,
) -> ApiResult<impl IntoResponse> {
    let caller = require_caller(query.user_id.as_deref(), "view your tickets")?;

    let status = query
        .status
        .as_deref()
        .map(|raw| raw.parse::<TicketStatus>())
        .transpose()
        .map_err(ApiError::validation_failed)?;
    let bounds = PageBounds::resolve(query.page, query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?;

    let tickets = state
        .db
        .ticket_list(&caller, status, bounds.limit, bounds.offset)
        .await?;

    // Unread counts fan out concurrently; the response keeps the primary
    // query's newest-first order regardless of completion order.
    let counts = try_join_all(
        tickets
            .iter()
            .map(|ticket| state.db.message_unread_count(ticket.id)),
    )
    .await?;
    let tickets: Vec<TicketResponse> = tickets
        .into_iter()
        .zip(counts)
        .map(|(mut ticket, count)| {
            ticket.unread_message_count = Some(count);
            ticket
        })
        .collect();

    let total = tickets.len() as i64;
    Ok(Json(TicketListEnvelope::new(
        tickets,
        Pagination {
            page: bounds.page,
            limit: bounds.limit,
            total,
        },
    )))
}

/// GET /api/v1/support/tickets/{ref} - Fetch a ticket with its messages
#[utoipa::path(
    get,
    path = "/api/v1/support/tickets/{ref}",
    tag = "Tickets",
    params(
        ("ref" = String, Path, description = "Ticket id or ticket number"),
    ),
    responses(
        (status = 200, description = "Ticket with messages", body = TicketDetailEnvelope),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
)]
pub async fn get_ticket(
    State(state): State<Arc<TicketState>>,
    PathTicketRef(reference): PathTicketRef,
) -> ApiResult<impl IntoResponse> {
    let ticket = state
        .db
        .ticket_locate(&reference)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    let messages = state.db.message_list_all(ticket.id).await?;

    Ok(Json(TicketDetailEnvelope::new(ticket, messages)))
}

/// PATCH /api/v1/support/tickets/{ref} - Partially update a ticket
#[utoipa::path(
    patch,
    path = "/api/v1/support/tickets/{ref}",
    tag = "Tickets",
    params(
        ("ref" = String, Path, description = "Ticket id or ticket number"),
    ),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated successfully", body = TicketEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
)]
pub async fn update_ticket(
    State(state): State<Arc<TicketState>>,
    PathTicketRef(reference): PathTicketRef,
    Json(req): Json<UpdateTicketRequest>,
) -> ApiResult<impl IntoResponse> {
    if !req.has_any_updates() {
        return Err(ApiError::validation_failed(
            "No fields to update. Provide at least one: status, assigned_to, \
             assigned_to_name, category, or priority",
        ));
    }

    let changes = TicketUpdateParams {
        status: req
            .status
            .as_deref()
            .map(|raw| raw.parse::<TicketStatus>())
            .transpose()
            .map_err(ApiError::validation_failed)?,
        assigned_to: req.assigned_to,
        assigned_to_name: req.assigned_to_name,
        category: req.category,
        priority: req
            .priority
            .as_deref()
            .map(|raw| raw.parse::<TicketPriority>())
            .transpose()
            .map_err(ApiError::validation_failed)?,
    };

    let ticket = state
        .db
        .ticket_locate(&reference)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    let updated = state
        .db
        .ticket_update(ticket.id, &changes)
        .await?
        .ok_or_else(|| ApiError::ticket_not_found(&reference))?;

    Ok(Json(TicketEnvelope::new(updated)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the ticket routes router.
pub fn create_router(db: DbClient) -> axum::Router {
    let state = Arc::new(TicketState::new(db));

    axum::Router::new()
        .route(
            "/",
            axum::routing::post(create_ticket).get(list_tickets),
        )
        .route(
            "/:reference",
            axum::routing::get(get_ticket).patch(update_ticket),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_caller_classifies_schemes() {
        let native = require_caller(Some("550e8400-e29b-41d4-a716-446655440000"), "test").unwrap();
        assert!(native.is_native());

        let foreign = require_caller(Some("gid://shopify/Customer/123"), "test").unwrap();
        assert!(!foreign.is_native());
    }

    #[test]
    fn test_require_caller_rejects_missing_identity() {
        let err = require_caller(None, "view your tickets").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.message.contains("view your tickets"));

        let err = require_caller(Some("   "), "view your tickets").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
