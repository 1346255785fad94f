//! Input validation helpers shared by the route handlers.

use crate::error::{ApiError, ApiResult};

/// Non-empty check for required string fields.
///
/// Whitespace-only values count as missing; the error names the field so
/// the caller knows what to supply.
pub trait ValidateNonEmpty {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Pagination parameters normalized from query input.
///
/// Pages are 1-based; an oversized limit is clamped to `max_limit` rather
/// than rejected, a non-positive page or limit is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageBounds {
    pub fn resolve(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: i64,
        max_limit: i64,
    ) -> ApiResult<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::invalid_input("page must be at least 1"));
        }
        let limit = limit.unwrap_or(default_limit);
        if limit < 1 {
            return Err(ApiError::invalid_input("limit must be at least 1"));
        }
        let limit = limit.min(max_limit);
        Ok(PageBounds {
            page,
            limit,
            offset: (page - 1) * limit,
        })
    }
}

/// Implemented by partial-update request bodies so handlers can reject a
/// request that names no recognized field.
pub trait HasUpdates {
    fn has_any_updates(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_treats_whitespace_as_missing() {
        assert!("subject line".validate_non_empty("subject").is_ok());
        assert!("  padded  ".validate_non_empty("subject").is_ok());
        assert!("".validate_non_empty("subject").is_err());
        assert!(" \t ".validate_non_empty("subject").is_err());
    }

    #[test]
    fn test_non_empty_through_option() {
        assert!(Some("value".to_string())
            .validate_non_empty("field")
            .is_ok());
        assert!(Some(String::new()).validate_non_empty("field").is_err());
        assert!(None::<String>.validate_non_empty("field").is_err());
    }

    #[test]
    fn test_page_bounds_defaults() {
        let bounds = PageBounds::resolve(None, None, 20, 100).unwrap();
        assert_eq!(bounds.page, 1);
        assert_eq!(bounds.limit, 20);
        assert_eq!(bounds.offset, 0);
    }

    #[test]
    fn test_page_bounds_offset() {
        let bounds = PageBounds::resolve(Some(3), Some(25), 20, 100).unwrap();
        assert_eq!(bounds.offset, 50);
    }

    #[test]
    fn test_page_bounds_clamps_limit() {
        let bounds = PageBounds::resolve(Some(1), Some(10_000), 20, 100).unwrap();
        assert_eq!(bounds.limit, 100);
    }

    #[test]
    fn test_page_bounds_rejects_nonpositive() {
        assert!(PageBounds::resolve(Some(0), None, 20, 100).is_err());
        assert!(PageBounds::resolve(None, Some(0), 20, 100).is_err());
        assert!(PageBounds::resolve(Some(-1), Some(-5), 20, 100).is_err());
    }
}
