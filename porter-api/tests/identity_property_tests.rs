//! Property-Based Tests for Identity Classification and Ticket Numbering
//!
//! **Property 1: Classification totality**
//!
//! For any native-format identity string, classification SHALL return the
//! native variant; for any other non-empty string it SHALL return the
//! foreign variant with the input preserved exactly. Classification is
//! deterministic and case-insensitive on hex digits.
//!
//! **Property 2: Ownership scoping**
//!
//! For any mix of native and foreign requester identities, the set of
//! tickets a caller matches SHALL be exactly the tickets created under
//! that caller's identity.
//!
//! **Property 3: Ticket number arithmetic**
//!
//! Formatting and suffix extraction round-trip; sequential allocation
//! yields unique, strictly increasing numbers.

use porter_core::{
    CallerIdentity, MessageAuthor, RequesterIdentity, SenderKind, TicketNumber, TicketRequester,
    DEFAULT_AGENT_NAME,
};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

/// Strategy for generating arbitrary UUIDs from raw bytes.
fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

/// Strategy for generating foreign identity strings.
///
/// Mixes third-party compound identifiers with free-form tokens; anything
/// that happens to match the native pattern is filtered out.
fn foreign_identity_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Platform-issued compound identifiers
        "gid://shopify/Customer/[0-9]{5,13}",
        // Prefixed account ids
        "(acct|cus|usr)_[A-Za-z0-9]{8,24}",
        // Free-form tokens
        "[A-Za-z0-9@._-]{1,40}",
    ]
    .prop_filter("must not match the native pattern", |s| {
        !porter_core::identity::is_native_id(s.trim()) && !s.trim().is_empty()
    })
}

/// Strategy for generating caller identities across both schemes.
fn caller_identity_strategy() -> impl Strategy<Value = CallerIdentity> {
    prop_oneof![
        uuid_strategy().prop_map(CallerIdentity::Native),
        foreign_identity_strategy().prop_map(CallerIdentity::Foreign),
    ]
}

// ============================================================================
// CLASSIFICATION PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_dashed_uuid_classifies_native(uuid in uuid_strategy()) {
        let token = uuid.hyphenated().to_string();
        prop_assert_eq!(
            CallerIdentity::classify(&token),
            Some(CallerIdentity::Native(uuid))
        );
    }

    #[test]
    fn prop_classification_is_case_insensitive(uuid in uuid_strategy()) {
        let lower = uuid.hyphenated().to_string();
        let upper = lower.to_ascii_uppercase();
        prop_assert_eq!(
            CallerIdentity::classify(&lower),
            CallerIdentity::classify(&upper)
        );
    }

    #[test]
    fn prop_undashed_uuid_classifies_foreign(uuid in uuid_strategy()) {
        let token = uuid.simple().to_string();
        prop_assert_eq!(
            CallerIdentity::classify(&token),
            Some(CallerIdentity::Foreign(token.clone()))
        );
    }

    #[test]
    fn prop_foreign_tokens_preserved_exactly(token in foreign_identity_strategy()) {
        match CallerIdentity::classify(&token) {
            Some(CallerIdentity::Foreign(stored)) => prop_assert_eq!(stored, token.trim()),
            other => prop_assert!(false, "expected foreign classification, got {:?}", other),
        }
    }

    #[test]
    fn prop_classification_is_deterministic(identity in caller_identity_strategy()) {
        let token = identity.to_string();
        prop_assert_eq!(
            CallerIdentity::classify(&token),
            CallerIdentity::classify(&token)
        );
    }
}

// ============================================================================
// STORAGE PROJECTION PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_projection_populates_exactly_one_side(identity in caller_identity_strategy()) {
        let requester = RequesterIdentity::from_caller(&identity);
        let (user_id, metadata) = requester.to_storage();
        prop_assert_eq!(user_id.is_some(), identity.is_native());
        prop_assert_eq!(metadata.is_some(), !identity.is_native());
    }

    #[test]
    fn prop_projection_round_trips(identity in caller_identity_strategy()) {
        let requester = RequesterIdentity::from_caller(&identity);
        let (user_id, metadata) = requester.to_storage();
        prop_assert_eq!(
            RequesterIdentity::from_storage(user_id, metadata.as_ref()),
            requester
        );
    }
}

// ============================================================================
// OWNERSHIP SCOPING PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_result_set_is_subset_of_owned(
        owners in prop::collection::vec(caller_identity_strategy(), 1..8),
        caller_index in 0usize..8,
    ) {
        let caller = &owners[caller_index % owners.len()];
        let rows: Vec<RequesterIdentity> =
            owners.iter().map(RequesterIdentity::from_caller).collect();

        for (row, owner) in rows.iter().zip(&owners) {
            if row.matches(caller) {
                // A matching row was necessarily created under the
                // caller's identity.
                prop_assert_eq!(owner, caller);
            }
            if owner == caller {
                prop_assert!(row.matches(caller));
            }
        }
    }

    #[test]
    fn prop_absent_identity_owned_by_nobody(identity in caller_identity_strategy()) {
        prop_assert!(!RequesterIdentity::Absent.matches(&identity));
    }
}

// ============================================================================
// TICKET NUMBER PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_number_format_round_trips(year in 2000i32..2100, sequence in 1u32..2_000_000) {
        let number = TicketNumber::format(year, sequence);
        prop_assert_eq!(
            TicketNumber::sequence_of(number.as_str(), year),
            Some(sequence)
        );
        // A number never extracts under a different year.
        prop_assert_eq!(TicketNumber::sequence_of(number.as_str(), year + 1), None);
    }

    #[test]
    fn prop_sequential_allocation_is_unique_and_increasing(
        year in 2000i32..2100,
        count in 1usize..50,
    ) {
        let mut max_existing = 0u32;
        let mut issued = Vec::with_capacity(count);
        for _ in 0..count {
            let number = TicketNumber::next(year, max_existing);
            let sequence = TicketNumber::sequence_of(number.as_str(), year)
                .expect("issued numbers carry this year's prefix");
            prop_assert!(sequence > max_existing);
            max_existing = sequence;
            issued.push(number);
        }
        let mut deduped = issued.clone();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), issued.len());
    }

    #[test]
    fn prop_ticket_numbers_classify_as_references(year in 2000i32..2100, sequence in 1u32..999_999) {
        // Numbers carry the TKT- prefix, so they can never be mistaken
        // for a native id when used as a path reference.
        let number = TicketNumber::format(year, sequence);
        prop_assert!(!porter_core::identity::is_native_id(number.as_str()));
    }
}

// ============================================================================
// ATTRIBUTION PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_agent_hint_always_agent(
        agent_id in prop::option::of(uuid_strategy()),
        name in prop::option::of("[A-Za-z ]{1,20}"),
    ) {
        let author = MessageAuthor::resolve(
            Some("agent"),
            agent_id,
            name.as_deref(),
            None,
            None,
            TicketRequester { name: "Requester", id: None },
        );
        prop_assert_eq!(author.kind, SenderKind::Agent);
        prop_assert_eq!(author.id, agent_id);
        match name {
            Some(name) => prop_assert_eq!(author.name, name),
            None => prop_assert_eq!(author.name, DEFAULT_AGENT_NAME),
        }
    }

    #[test]
    fn prop_user_identifier_never_foreign(
        caller in prop::option::of(caller_identity_strategy()),
        ticket_id in prop::option::of(uuid_strategy()),
    ) {
        let token = caller.as_ref().map(|c| c.to_string());
        let author = MessageAuthor::resolve(
            None,
            None,
            None,
            None,
            token.as_deref(),
            TicketRequester { name: "Requester", id: ticket_id },
        );
        prop_assert_eq!(author.kind, SenderKind::User);
        // The identifier is the caller's native id, else the ticket's,
        // else unset; a foreign token never leaks into the id field.
        match caller.as_ref().and_then(CallerIdentity::native_id) {
            Some(native) => prop_assert_eq!(author.id, Some(native)),
            None => prop_assert_eq!(author.id, ticket_id),
        }
    }
}
