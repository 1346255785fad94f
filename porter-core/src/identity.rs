//! Caller identity classification.
//!
//! Two identity schemes coexist in Porter: native identifiers issued by
//! this system (canonical dashed-hex UUIDs) and foreign identity strings
//! issued by third-party platforms (e.g. `gid://shopify/Customer/123`).
//! Classification is the single source of truth for which storage
//! projection an identity uses, and every handler goes through it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Metadata key under which a foreign requester identity is stored.
pub const METADATA_IDENTITY_KEY: &str = "original_user_id";

/// Strict dashed UUID form (8-4-4-4-12 hex groups, case-insensitive).
///
/// `Uuid::parse_str` also accepts undashed, braced, and urn encodings;
/// those must classify as foreign, so the pattern is checked first.
static NATIVE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("native id pattern is a valid regex")
});

/// Check whether a token is in the canonical native identifier form.
pub fn is_native_id(token: &str) -> bool {
    NATIVE_ID_PATTERN.is_match(token)
}

// ============================================================================
// CALLER IDENTITY
// ============================================================================

/// A caller-supplied identity, classified into one of the two schemes.
///
/// A caller identity is asserted, never authenticated; once asserted it is
/// the sole basis for scoping visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallerIdentity {
    /// System-issued identifier in canonical dashed-hex form.
    Native(Uuid),
    /// Any other non-empty identity string.
    Foreign(String),
}

impl CallerIdentity {
    /// Classify a caller-supplied token.
    ///
    /// Returns `None` for empty or whitespace-only tokens; callers must
    /// reject those as a missing identity before any query runs. For
    /// non-empty tokens classification is total: the strict dashed UUID
    /// form is native, everything else is foreign.
    pub fn classify(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if is_native_id(token) {
            if let Ok(id) = Uuid::parse_str(token) {
                return Some(CallerIdentity::Native(id));
            }
        }
        Some(CallerIdentity::Foreign(token.to_string()))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, CallerIdentity::Native(_))
    }

    /// The native identifier, when this identity is native.
    pub fn native_id(&self) -> Option<Uuid> {
        match self {
            CallerIdentity::Native(id) => Some(*id),
            CallerIdentity::Foreign(_) => None,
        }
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerIdentity::Native(id) => write!(f, "{}", id),
            CallerIdentity::Foreign(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// REQUESTER IDENTITY
// ============================================================================

/// A ticket's recorded requester identity.
///
/// Projected to storage as exactly one of the `user_id` column or the
/// `original_user_id` metadata entry. `Absent` means no identity was
/// supplied at creation; an absent identity is owned by nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequesterIdentity {
    Native(Uuid),
    Foreign(String),
    Absent,
}

impl RequesterIdentity {
    pub fn from_caller(caller: &CallerIdentity) -> Self {
        match caller {
            CallerIdentity::Native(id) => RequesterIdentity::Native(*id),
            CallerIdentity::Foreign(s) => RequesterIdentity::Foreign(s.clone()),
        }
    }

    /// Project to the storage columns: `(user_id, metadata)`.
    ///
    /// At most one side of the pair is populated.
    pub fn to_storage(&self) -> (Option<Uuid>, Option<JsonValue>) {
        match self {
            RequesterIdentity::Native(id) => (Some(*id), None),
            RequesterIdentity::Foreign(s) => (
                None,
                Some(serde_json::json!({ METADATA_IDENTITY_KEY: s })),
            ),
            RequesterIdentity::Absent => (None, None),
        }
    }

    /// Reconstruct from the storage columns.
    ///
    /// The native column wins when both are somehow populated; the
    /// creation invariant makes that state unreachable.
    pub fn from_storage(user_id: Option<Uuid>, metadata: Option<&JsonValue>) -> Self {
        if let Some(id) = user_id {
            return RequesterIdentity::Native(id);
        }
        if let Some(original) = metadata
            .and_then(|m| m.get(METADATA_IDENTITY_KEY))
            .and_then(|v| v.as_str())
        {
            return RequesterIdentity::Foreign(original.to_string());
        }
        RequesterIdentity::Absent
    }

    /// Whether `caller` owns a record bearing this requester identity.
    ///
    /// Native callers match native identities only, foreign callers match
    /// foreign identities only; there is no cross-scheme fallback.
    pub fn matches(&self, caller: &CallerIdentity) -> bool {
        match (self, caller) {
            (RequesterIdentity::Native(a), CallerIdentity::Native(b)) => a == b,
            (RequesterIdentity::Foreign(a), CallerIdentity::Foreign(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_native() {
        let id = CallerIdentity::classify("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(
            id,
            Some(CallerIdentity::Native(
                Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
            ))
        );
    }

    #[test]
    fn test_classify_native_is_case_insensitive() {
        let lower = CallerIdentity::classify("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let upper = CallerIdentity::classify("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(lower, upper);
        assert!(lower.is_native());
    }

    #[test]
    fn test_classify_foreign() {
        let id = CallerIdentity::classify("gid://shopify/Customer/8971995087157");
        assert_eq!(
            id,
            Some(CallerIdentity::Foreign(
                "gid://shopify/Customer/8971995087157".to_string()
            ))
        );
    }

    #[test]
    fn test_undashed_hex_is_foreign() {
        // Uuid::parse_str would accept this; classification must not.
        let id = CallerIdentity::classify("550e8400e29b41d4a716446655440000").unwrap();
        assert!(!id.is_native());
    }

    #[test]
    fn test_classify_rejects_empty() {
        assert_eq!(CallerIdentity::classify(""), None);
        assert_eq!(CallerIdentity::classify("   "), None);
    }

    #[test]
    fn test_classify_trims_whitespace() {
        let id = CallerIdentity::classify("  550e8400-e29b-41d4-a716-446655440000  ").unwrap();
        assert!(id.is_native());
    }

    #[test]
    fn test_storage_projection_native() {
        let caller = CallerIdentity::classify("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let requester = RequesterIdentity::from_caller(&caller);
        let (user_id, metadata) = requester.to_storage();
        assert!(user_id.is_some());
        assert!(metadata.is_none());
    }

    #[test]
    fn test_storage_projection_foreign() {
        let caller = CallerIdentity::classify("gid://shopify/Customer/123").unwrap();
        let requester = RequesterIdentity::from_caller(&caller);
        let (user_id, metadata) = requester.to_storage();
        assert!(user_id.is_none());
        assert_eq!(
            metadata.unwrap()[METADATA_IDENTITY_KEY],
            "gid://shopify/Customer/123"
        );
    }

    #[test]
    fn test_storage_round_trip() {
        for token in [
            "550e8400-e29b-41d4-a716-446655440000",
            "gid://shopify/Customer/123",
        ] {
            let requester =
                RequesterIdentity::from_caller(&CallerIdentity::classify(token).unwrap());
            let (user_id, metadata) = requester.to_storage();
            assert_eq!(
                RequesterIdentity::from_storage(user_id, metadata.as_ref()),
                requester
            );
        }
        assert_eq!(
            RequesterIdentity::from_storage(None, None),
            RequesterIdentity::Absent
        );
    }

    #[test]
    fn test_ownership_never_crosses_schemes() {
        let native = CallerIdentity::classify("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let foreign = CallerIdentity::classify("550e8400").unwrap();

        let native_row = RequesterIdentity::from_caller(&native);
        let foreign_row = RequesterIdentity::from_caller(&foreign);

        assert!(native_row.matches(&native));
        assert!(!native_row.matches(&foreign));
        assert!(foreign_row.matches(&foreign));
        assert!(!foreign_row.matches(&native));
        assert!(!RequesterIdentity::Absent.matches(&native));
        assert!(!RequesterIdentity::Absent.matches(&foreign));
    }
}
