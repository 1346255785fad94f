//! Message attribution.
//!
//! Authorship of a new ticket message is reconciled from three sources:
//! the caller-supplied hint and fields, the caller identity, and the
//! parent ticket's recorded requester. The resolver never rejects a
//! message for a missing identifier; a message may carry only a display
//! name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::CallerIdentity;
use crate::ticket::SenderKind;

/// Display name used for agent messages that arrive without one.
pub const DEFAULT_AGENT_NAME: &str = "Support Agent";

/// Resolved authorship fields for a new ticket message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageAuthor {
    pub kind: SenderKind,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub id: Option<Uuid>,
    pub name: String,
}

/// The parent-ticket fields attribution falls back to.
#[derive(Debug, Clone, Copy)]
pub struct TicketRequester<'a> {
    pub name: &'a str,
    pub id: Option<Uuid>,
}

impl MessageAuthor {
    /// Reconcile caller-supplied authorship against the parent ticket.
    ///
    /// Agent hint: kind is agent, identifier is the supplied agent id or
    /// unset, name is the supplied name or [`DEFAULT_AGENT_NAME`].
    ///
    /// Anything else is a requester message: name falls back to the
    /// ticket's requester name; the identifier is the caller identity only
    /// when it classifies as native, else the ticket's recorded native
    /// requester id, else unset. Foreign identities never become sender
    /// identifiers.
    pub fn resolve(
        kind_hint: Option<&str>,
        agent_id: Option<Uuid>,
        agent_name: Option<&str>,
        caller_name: Option<&str>,
        caller_identity: Option<&str>,
        ticket: TicketRequester<'_>,
    ) -> Self {
        match SenderKind::from_hint(kind_hint) {
            SenderKind::Agent => MessageAuthor {
                kind: SenderKind::Agent,
                id: agent_id,
                name: agent_name.unwrap_or(DEFAULT_AGENT_NAME).to_string(),
            },
            SenderKind::User => {
                let id = caller_identity
                    .and_then(CallerIdentity::classify)
                    .and_then(|caller| caller.native_id())
                    .or(ticket.id);
                MessageAuthor {
                    kind: SenderKind::User,
                    id,
                    name: caller_name.unwrap_or(ticket.name).to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_with(id: Option<Uuid>) -> TicketRequester<'static> {
        TicketRequester {
            name: "Jordan Smith",
            id,
        }
    }

    #[test]
    fn test_agent_with_defaults() {
        let author = MessageAuthor::resolve(Some("agent"), None, None, None, None, ticket_with(None));
        assert_eq!(author.kind, SenderKind::Agent);
        assert_eq!(author.id, None);
        assert_eq!(author.name, DEFAULT_AGENT_NAME);
    }

    #[test]
    fn test_agent_with_supplied_fields() {
        let agent_id = Uuid::new_v4();
        let author = MessageAuthor::resolve(
            Some("agent"),
            Some(agent_id),
            Some("Avery"),
            Some("should be ignored"),
            Some("gid://shopify/Customer/123"),
            ticket_with(Some(Uuid::new_v4())),
        );
        assert_eq!(author.kind, SenderKind::Agent);
        assert_eq!(author.id, Some(agent_id));
        assert_eq!(author.name, "Avery");
    }

    #[test]
    fn test_user_native_identity_wins() {
        let caller = "550e8400-e29b-41d4-a716-446655440000";
        let ticket_id = Uuid::new_v4();
        let author = MessageAuthor::resolve(
            None,
            None,
            None,
            Some("Jordan"),
            Some(caller),
            ticket_with(Some(ticket_id)),
        );
        assert_eq!(author.kind, SenderKind::User);
        assert_eq!(author.id, Some(Uuid::parse_str(caller).unwrap()));
        assert_eq!(author.name, "Jordan");
    }

    #[test]
    fn test_user_foreign_identity_falls_back_to_ticket() {
        let ticket_id = Uuid::new_v4();
        let author = MessageAuthor::resolve(
            Some("user"),
            None,
            None,
            None,
            Some("gid://shopify/Customer/123"),
            ticket_with(Some(ticket_id)),
        );
        assert_eq!(author.id, Some(ticket_id));
        assert_eq!(author.name, "Jordan Smith");
    }

    #[test]
    fn test_user_without_any_identifier() {
        let author = MessageAuthor::resolve(
            None,
            None,
            None,
            None,
            Some("gid://shopify/Customer/123"),
            ticket_with(None),
        );
        assert_eq!(author.kind, SenderKind::User);
        assert_eq!(author.id, None);
        assert_eq!(author.name, "Jordan Smith");
    }

    #[test]
    fn test_unknown_hint_is_user() {
        let author = MessageAuthor::resolve(
            Some("administrator"),
            Some(Uuid::new_v4()),
            Some("Agent Name"),
            None,
            None,
            ticket_with(None),
        );
        assert_eq!(author.kind, SenderKind::User);
        assert_eq!(author.name, "Jordan Smith");
    }
}
