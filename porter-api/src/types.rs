//! API Request and Response Types
//!
//! This module defines all request and response types for the Porter API.
//! Success responses use the `{"success": true, "data": {...}}` envelope;
//! errors use the envelope defined in [`crate::error`].

use chrono::NaiveDate;
use porter_core::{
    CallerIdentity, RequesterIdentity, SenderKind, TicketPriority, TicketStatus, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::validation::HasUpdates;

// ============================================================================
// TICKET TYPES
// ============================================================================

/// Request to create a new support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTicketRequest {
    /// Caller identity (native id or foreign identity string)
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// One of low, medium, high, urgent; defaults to medium
    pub priority: Option<String>,
}

/// Query parameters for the ticket listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListTicketsQuery {
    /// Caller identity; absent means the request is rejected with 401
    pub user_id: Option<String>,
    /// Filter by lifecycle status
    pub status: Option<String>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size (max 100)
    pub limit: Option<i64>,
}

/// Request to partially update a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTicketRequest {
    /// New status (if changing)
    pub status: Option<String>,
    /// New assignee id (if changing)
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_to: Option<Uuid>,
    /// New assignee display name (if changing)
    pub assigned_to_name: Option<String>,
    /// New category (if changing)
    pub category: Option<String>,
    /// New priority (if changing)
    pub priority: Option<String>,
}

impl HasUpdates for UpdateTicketRequest {
    fn has_any_updates(&self) -> bool {
        self.status.is_some()
            || self.assigned_to.is_some()
            || self.assigned_to_name.is_some()
            || self.category.is_some()
            || self.priority.is_some()
    }
}

/// Ticket response with full details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    pub ticket_number: String,
    /// Native requester identifier; unset for foreign-identity requesters
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    /// Holds `original_user_id` for foreign-identity requesters
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<JsonValue>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub resolved_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub closed_at: Option<Timestamp>,
    /// Unread agent messages; populated on listings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_message_count: Option<i64>,
}

impl TicketResponse {
    /// The requester identity recorded on this ticket, reconstructed from
    /// its storage projection.
    pub fn requester_identity(&self) -> RequesterIdentity {
        RequesterIdentity::from_storage(self.user_id, self.metadata.as_ref())
    }

    /// Whether `caller` owns this ticket.
    pub fn owned_by(&self, caller: &CallerIdentity) -> bool {
        self.requester_identity().matches(caller)
    }
}

// ============================================================================
// MESSAGE TYPES
// ============================================================================

/// Request to append a message to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendMessageRequest {
    /// Message body; must be non-empty after trimming
    pub message: Option<String>,
    /// Attachment descriptors, stored as given
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    pub attachments: Option<Vec<JsonValue>>,
    /// Caller identity for requester messages
    pub user_id: Option<String>,
    /// Caller display name for requester messages
    pub user_name: Option<String>,
    /// Agent identifier for agent messages
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub sender_id: Option<Uuid>,
    /// Agent display name for agent messages
    pub sender_name: Option<String>,
    /// "agent" for agent messages; anything else is a requester message
    pub sender_type: Option<String>,
}

/// Query parameters for the message listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListMessagesQuery {
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size (max 100)
    pub limit: Option<i64>,
    /// Only return messages created strictly after this instant
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub since: Option<Timestamp>,
}

/// Request to mark ticket messages as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MarkMessagesReadRequest {
    /// Explicit message ids; when absent, all agent messages are marked
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<String>>))]
    pub message_ids: Option<Vec<Uuid>>,
}

/// Ticket message with full details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub ticket_id: Uuid,
    pub sender_type: SenderKind,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub sender_id: Option<Uuid>,
    pub sender_name: String,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub attachments: JsonValue,
    pub is_read: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub read_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

// ============================================================================
// HABIT TYPES
// ============================================================================

/// Request to upsert one day's compliance for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpsertComplianceRequest {
    /// Caller identity (native id or foreign identity string)
    pub user_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub habit_id: Option<Uuid>,
    /// Calendar day; defaults to today (UTC)
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub date: Option<NaiveDate>,
    pub slot1_done: Option<bool>,
    pub slot2_done: Option<bool>,
    pub slot3_done: Option<bool>,
    pub slot4_done: Option<bool>,
    pub slot1_note: Option<String>,
    pub slot2_note: Option<String>,
    pub slot3_note: Option<String>,
    pub slot4_note: Option<String>,
}

impl UpsertComplianceRequest {
    /// The four slot flags in slot order.
    pub fn done_flags(&self) -> [Option<bool>; 4] {
        [
            self.slot1_done,
            self.slot2_done,
            self.slot3_done,
            self.slot4_done,
        ]
    }
}

/// One day's compliance record for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplianceResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub habit_id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub compliance_date: NaiveDate,
    pub slot1_done: Option<bool>,
    pub slot2_done: Option<bool>,
    pub slot3_done: Option<bool>,
    pub slot4_done: Option<bool>,
    pub slot1_note: Option<String>,
    pub slot2_note: Option<String>,
    pub slot3_note: Option<String>,
    pub slot4_note: Option<String>,
    /// Derived score in [0, 1]
    pub compliance_score: f64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// A tracked habit with its compliance for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HabitResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    pub name: String,
    pub slots_per_day: i16,
    pub today: Option<ComplianceResponse>,
}

/// Running per-user tracker totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackerTotals {
    pub total_days_tracked: i64,
    pub perfect_days: i64,
    pub current_streak: i64,
}

/// A reward and its unlock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RewardResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    pub title: String,
    pub threshold_days: i64,
    pub unlocked: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub unlocked_at: Option<Timestamp>,
}

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

/// Pagination echo attached to listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// Envelope carrying a single ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketEnvelope {
    pub success: bool,
    pub data: TicketData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketData {
    pub ticket: TicketResponse,
}

impl TicketEnvelope {
    pub fn new(ticket: TicketResponse) -> Self {
        Self {
            success: true,
            data: TicketData { ticket },
        }
    }
}

/// Envelope carrying a page of tickets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketListEnvelope {
    pub success: bool,
    pub data: TicketListData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketListData {
    pub tickets: Vec<TicketResponse>,
    pub pagination: Pagination,
}

impl TicketListEnvelope {
    pub fn new(tickets: Vec<TicketResponse>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data: TicketListData {
                tickets,
                pagination,
            },
        }
    }
}

/// Envelope carrying a ticket together with its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketDetailEnvelope {
    pub success: bool,
    pub data: TicketDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TicketDetailData {
    pub ticket: TicketResponse,
    pub messages: Vec<MessageResponse>,
}

impl TicketDetailEnvelope {
    pub fn new(ticket: TicketResponse, messages: Vec<MessageResponse>) -> Self {
        Self {
            success: true,
            data: TicketDetailData { ticket, messages },
        }
    }
}

/// Envelope carrying a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageEnvelope {
    pub success: bool,
    pub data: MessageData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageData {
    pub message: MessageResponse,
}

impl MessageEnvelope {
    pub fn new(message: MessageResponse) -> Self {
        Self {
            success: true,
            data: MessageData { message },
        }
    }
}

/// Envelope carrying a page of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageListEnvelope {
    pub success: bool,
    pub data: MessageListData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageListData {
    pub messages: Vec<MessageResponse>,
    pub pagination: Pagination,
}

impl MessageListEnvelope {
    pub fn new(messages: Vec<MessageResponse>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data: MessageListData {
                messages,
                pagination,
            },
        }
    }
}

/// Response to a mark-read request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: String,
    /// Number of messages transitioned to read
    pub updated: u64,
}

impl MarkReadResponse {
    pub fn new(updated: u64) -> Self {
        Self {
            success: true,
            message: "Messages marked as read".to_string(),
            updated,
        }
    }
}

/// Envelope carrying one upserted compliance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplianceEnvelope {
    pub success: bool,
    pub data: ComplianceData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplianceData {
    pub compliance: ComplianceResponse,
}

impl ComplianceEnvelope {
    pub fn new(compliance: ComplianceResponse) -> Self {
        Self {
            success: true,
            data: ComplianceData { compliance },
        }
    }
}

/// Envelope carrying the aggregate tracker view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackerEnvelope {
    pub success: bool,
    pub data: TrackerData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackerData {
    pub user_id: String,
    pub totals: TrackerTotals,
    pub habits: Vec<HabitResponse>,
    pub rewards: Vec<RewardResponse>,
}

impl TrackerEnvelope {
    pub fn new(data: TrackerData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::METADATA_IDENTITY_KEY;

    fn sample_ticket(user_id: Option<Uuid>, metadata: Option<JsonValue>) -> TicketResponse {
        let now = chrono::Utc::now();
        TicketResponse {
            id: Uuid::new_v4(),
            ticket_number: "TKT-2026-000001".to_string(),
            user_id,
            user_name: "Jordan".to_string(),
            user_email: "jordan@example.com".to_string(),
            user_phone: "555".to_string(),
            subject: "S".to_string(),
            description: "D".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            category: None,
            assigned_to: None,
            assigned_to_name: None,
            metadata,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            closed_at: None,
            unread_message_count: None,
        }
    }

    #[test]
    fn test_update_request_has_updates() {
        let empty = UpdateTicketRequest::default();
        assert!(!empty.has_any_updates());

        let with_status = UpdateTicketRequest {
            status: Some("resolved".to_string()),
            ..Default::default()
        };
        assert!(with_status.has_any_updates());
    }

    #[test]
    fn test_ticket_ownership_native() {
        let id = Uuid::new_v4();
        let ticket = sample_ticket(Some(id), None);
        let owner = CallerIdentity::Native(id);
        let other = CallerIdentity::Native(Uuid::new_v4());

        assert!(ticket.owned_by(&owner));
        assert!(!ticket.owned_by(&other));
    }

    #[test]
    fn test_ticket_ownership_foreign() {
        let ticket = sample_ticket(
            None,
            Some(serde_json::json!({ METADATA_IDENTITY_KEY: "gid://shopify/Customer/123" })),
        );
        let owner = CallerIdentity::Foreign("gid://shopify/Customer/123".to_string());
        let other = CallerIdentity::Foreign("gid://shopify/Customer/999".to_string());

        assert!(ticket.owned_by(&owner));
        assert!(!ticket.owned_by(&other));
    }

    #[test]
    fn test_unread_count_omitted_when_absent() {
        let ticket = sample_ticket(None, None);
        let json = serde_json::to_string(&ticket).unwrap();
        assert!(!json.contains("unread_message_count"));
    }

    #[test]
    fn test_compliance_request_done_flags() {
        let req = UpsertComplianceRequest {
            slot1_done: Some(true),
            slot3_done: Some(false),
            ..Default::default()
        };
        assert_eq!(req.done_flags(), [Some(true), None, Some(false), None]);
    }
}
