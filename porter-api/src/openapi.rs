//! OpenAPI Specification for the Porter API
//!
//! This module defines the OpenAPI document for the Porter REST API.
//! It uses utoipa to generate the specification from Rust types and
//! route annotations; the document is served at /openapi.json.

use utoipa::OpenApi;

use crate::error::{ErrorCode, ErrorResponse};
use crate::types::*;

// Import route modules for path references
use crate::routes::{habit, health, message, ticket};

// Import domain types from porter-core
use porter_core::{SenderKind, TicketPriority, TicketStatus};

/// OpenAPI document for the Porter API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Porter API",
        version = "0.2.0",
        description = "REST backend for support tickets with threaded messaging and daily habit compliance tracking",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Tickets", description = "Support ticket creation, ownership-scoped listing, lookup, and updates"),
        (name = "Messages", description = "Threaded ticket messaging and read tracking"),
        (name = "Habits", description = "Daily habit compliance and tracker aggregates"),
    ),
    paths(
        // === Health ===
        health::health,
        // === Ticket Routes ===
        ticket::create_ticket,
        ticket::list_tickets,
        ticket::get_ticket,
        ticket::update_ticket,
        // === Message Routes ===
        message::send_message,
        message::list_messages,
        message::mark_messages_read,
        // === Habit Routes ===
        habit::upsert_daily_compliance,
        habit::get_tracker,
    ),
    components(schemas(
        // Error types
        ErrorCode,
        ErrorResponse,
        // Domain enums
        TicketStatus,
        TicketPriority,
        SenderKind,
        // Ticket types
        CreateTicketRequest,
        UpdateTicketRequest,
        TicketResponse,
        TicketEnvelope,
        TicketData,
        TicketListEnvelope,
        TicketListData,
        TicketDetailEnvelope,
        TicketDetailData,
        Pagination,
        // Message types
        SendMessageRequest,
        MarkMessagesReadRequest,
        MessageResponse,
        MessageEnvelope,
        MessageData,
        MessageListEnvelope,
        MessageListData,
        MarkReadResponse,
        // Habit types
        UpsertComplianceRequest,
        ComplianceResponse,
        ComplianceEnvelope,
        ComplianceData,
        HabitResponse,
        TrackerTotals,
        RewardResponse,
        TrackerEnvelope,
        TrackerData,
        // Health types
        health::HealthResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).expect("document serializes");
        assert!(json.contains("/api/v1/support/tickets"));
        assert!(json.contains("/api/v1/habits/daily-compliance"));
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/health"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/support/tickets/{ref}/messages/read"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/habits/tracker/{user_id}"));
    }
}
