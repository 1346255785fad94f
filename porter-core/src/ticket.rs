//! Ticket enums, references, and number arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identity::CallerIdentity;

// ============================================================================
// LIFECYCLE ENUMS
// ============================================================================

/// Lifecycle status of a support ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Wire names of every variant, in declaration order. Used to build
    /// validation messages that enumerate the acceptable values.
    pub const VARIANTS: [&'static str; 4] = ["open", "in_progress", "resolved", "closed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!(
                "Invalid status. Must be one of: {}",
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

/// Priority of a support ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub const VARIANTS: [&'static str; 4] = ["low", "medium", "high", "urgent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            _ => Err(format!(
                "Invalid priority. Must be one of: {}",
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

/// Who authored a ticket message. Immutable once a message is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    /// The ticket requester.
    #[default]
    User,
    /// A support agent.
    Agent,
}

impl SenderKind {
    /// Resolve a caller-supplied hint. `"agent"` selects the agent kind;
    /// any other value, including none, is a requester message.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("agent") => SenderKind::Agent,
            _ => SenderKind::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::User => "user",
            SenderKind::Agent => "agent",
        }
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SenderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(SenderKind::User),
            "agent" => Ok(SenderKind::Agent),
            _ => Err(format!("Invalid sender type: {}", s)),
        }
    }
}

// ============================================================================
// TICKET REFERENCES
// ============================================================================

/// A path-supplied ticket reference.
///
/// Tickets are addressable interchangeably by internal identifier or by
/// human-facing ticket number. Ticket numbers carry the `TKT-` prefix and
/// can never collide with the dashed-UUID form, so exactly one lookup
/// strategy applies per reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketRef {
    ById(Uuid),
    ByNumber(String),
}

impl TicketRef {
    /// Classify a raw reference. Returns `None` for empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        match CallerIdentity::classify(raw)? {
            CallerIdentity::Native(id) => Some(TicketRef::ById(id)),
            CallerIdentity::Foreign(number) => Some(TicketRef::ByNumber(number)),
        }
    }
}

impl FromStr for TicketRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketRef::parse(s).ok_or_else(|| "Ticket reference must not be empty".to_string())
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketRef::ById(id) => write!(f, "{}", id),
            TicketRef::ByNumber(number) => write!(f, "{}", number),
        }
    }
}

// ============================================================================
// TICKET NUMBERS
// ============================================================================

/// Human-facing ticket number: `TKT-<year>-<6-digit sequence>`.
///
/// Unique and monotonically increasing per calendar year; immutable once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    pub const PREFIX: &'static str = "TKT";

    /// Format a number for the given year and sequence value.
    pub fn format(year: i32, sequence: u32) -> Self {
        TicketNumber(format!("{}-{}-{:06}", Self::PREFIX, year, sequence))
    }

    /// The prefix shared by every number issued in `year`, for LIKE scans.
    pub fn year_prefix(year: i32) -> String {
        format!("{}-{}-", Self::PREFIX, year)
    }

    /// Extract the numeric suffix of `raw` when it belongs to `year`.
    pub fn sequence_of(raw: &str, year: i32) -> Option<u32> {
        raw.strip_prefix(&Self::year_prefix(year))?.parse().ok()
    }

    /// The next number for `year`, given the highest suffix already issued
    /// (0 when none exist).
    pub fn next(year: i32, max_existing: u32) -> Self {
        Self::format(year, max_existing + 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TicketNumber {
    fn from(raw: String) -> Self {
        TicketNumber(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for name in TicketStatus::VARIANTS {
            let status: TicketStatus = name.parse().unwrap();
            assert_eq!(status.as_str(), name);
        }
    }

    #[test]
    fn test_status_parse_error_lists_values() {
        let err = "reopened".parse::<TicketStatus>().unwrap_err();
        assert!(err.contains("open, in_progress, resolved, closed"));
    }

    #[test]
    fn test_priority_parse_error_lists_values() {
        let err = "critical".parse::<TicketPriority>().unwrap_err();
        assert!(err.contains("low, medium, high, urgent"));
    }

    #[test]
    fn test_sender_kind_from_hint() {
        assert_eq!(SenderKind::from_hint(Some("agent")), SenderKind::Agent);
        assert_eq!(SenderKind::from_hint(Some("user")), SenderKind::User);
        assert_eq!(SenderKind::from_hint(Some("anything")), SenderKind::User);
        assert_eq!(SenderKind::from_hint(None), SenderKind::User);
    }

    #[test]
    fn test_ticket_ref_by_id() {
        let raw = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(
            TicketRef::parse(raw),
            Some(TicketRef::ById(Uuid::parse_str(raw).unwrap()))
        );
    }

    #[test]
    fn test_ticket_ref_by_number() {
        assert_eq!(
            TicketRef::parse("TKT-2026-000042"),
            Some(TicketRef::ByNumber("TKT-2026-000042".to_string()))
        );
    }

    #[test]
    fn test_ticket_ref_empty() {
        assert_eq!(TicketRef::parse(""), None);
        assert!("  ".parse::<TicketRef>().is_err());
    }

    #[test]
    fn test_number_format() {
        assert_eq!(TicketNumber::format(2026, 1).as_str(), "TKT-2026-000001");
        assert_eq!(TicketNumber::format(2026, 123456).as_str(), "TKT-2026-123456");
        // Sequences past six digits keep their full width.
        assert_eq!(TicketNumber::format(2026, 1234567).as_str(), "TKT-2026-1234567");
    }

    #[test]
    fn test_sequence_of() {
        assert_eq!(TicketNumber::sequence_of("TKT-2026-000042", 2026), Some(42));
        assert_eq!(TicketNumber::sequence_of("TKT-2025-000042", 2026), None);
        assert_eq!(TicketNumber::sequence_of("TKT-2026-abc", 2026), None);
        assert_eq!(TicketNumber::sequence_of("something-else", 2026), None);
    }

    #[test]
    fn test_next_is_strictly_increasing() {
        let first = TicketNumber::next(2026, 0);
        assert_eq!(first.as_str(), "TKT-2026-000001");
        let seq = TicketNumber::sequence_of(first.as_str(), 2026).unwrap();
        let second = TicketNumber::next(2026, seq);
        assert_eq!(second.as_str(), "TKT-2026-000002");
    }
}
