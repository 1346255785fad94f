//! Porter Core - Entity Types and Decision Logic
//!
//! Pure data structures and the identity/numbering rules shared by the
//! Porter backend. This crate contains no I/O: classification of caller
//! identities, ticket reference resolution, ticket number arithmetic,
//! message attribution, and the habit compliance score all live here so
//! that every HTTP handler applies exactly the same rules.

pub mod habit;
pub mod identity;
pub mod message;
pub mod ticket;

pub use habit::{compliance_score, current_streak};
pub use identity::{CallerIdentity, RequesterIdentity, METADATA_IDENTITY_KEY};
pub use message::{MessageAuthor, TicketRequester, DEFAULT_AGENT_NAME};
pub use ticket::{SenderKind, TicketNumber, TicketPriority, TicketRef, TicketStatus};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
