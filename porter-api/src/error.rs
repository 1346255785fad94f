//! API error taxonomy.
//!
//! Every failure a handler can produce is an [`ApiError`]: an
//! [`ErrorCode`] naming the category, a human-readable message, and
//! optional diagnostic detail. The `IntoResponse` impl renders the JSON
//! envelope `{"success": false, "message": ..., "error": ...?}` with the
//! status derived from the code, so no failure path escapes without a
//! well-formed response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Failure categories, each mapped to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller identity absent on an identity-scoped endpoint (401).
    AuthenticationRequired,

    /// Request failed validation: missing field, invalid enum value (400).
    ValidationFailed,
    /// Input well-formed but unusable, e.g. a non-positive page (400).
    InvalidInput,
    /// A specific required field is absent (400).
    MissingField,

    /// No ticket matches the supplied reference (404).
    TicketNotFound,
    /// No habit visible to the caller matches the supplied id (404).
    HabitNotFound,

    /// Ownership post-verification caught a row the caller does not own;
    /// the predicate and verification logic have diverged (500).
    OwnershipViolation,
    /// Unexpected failure with no better category (500).
    InternalError,
    /// The store reported an error (500).
    DatabaseError,

    /// The connection pool is closed or unusable (503).
    ServiceUnavailable,
    /// No pool connection became available in time (503).
    ConnectionPoolExhausted,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::AuthenticationRequired => StatusCode::UNAUTHORIZED,

            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::TicketNotFound | ErrorCode::HabitNotFound => StatusCode::NOT_FOUND,

            ErrorCode::OwnershipViolation
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Message used when the construction site supplies none.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::AuthenticationRequired => "Authentication required",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::TicketNotFound => "Ticket not found",
            ErrorCode::HabitNotFound => "Habit not found",
            ErrorCode::OwnershipViolation => "Security error: Invalid ticket access detected",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// The error type every handler and storage call returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Diagnostic detail surfaced to operators in the envelope's `error`
    /// field. May carry store diagnostics; never another caller's data.
    pub detail: Option<String>,
}

/// Wire shape of the error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // Constructors, one per code the handlers raise directly.

    pub fn authentication_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthenticationRequired, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn ticket_not_found(reference: impl fmt::Display) -> Self {
        Self::from_code(ErrorCode::TicketNotFound)
            .with_detail(format!("No ticket matches reference {}", reference))
    }

    pub fn habit_not_found(habit_id: impl fmt::Display) -> Self {
        Self::from_code(ErrorCode::HabitNotFound)
            .with_detail(format!("No habit matches id {}", habit_id))
    }

    /// The response body never carries the offending rows.
    pub fn ownership_violation() -> Self {
        Self::from_code(ErrorCode::OwnershipViolation)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            message: self.message,
            error: self.detail,
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// COLLABORATOR ERROR CONVERSIONS
// ============================================================================

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        // Store diagnostics ride along for operator use.
        ApiError::database_error("Database operation failed").with_detail(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);
        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Result alias used throughout the API layer.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ErrorCode::AuthenticationRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::ValidationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TicketNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::OwnershipViolation.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ConnectionPoolExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_constructors_carry_context() {
        let err = ApiError::authentication_required("Please log in to view your tickets.");
        assert_eq!(err.code, ErrorCode::AuthenticationRequired);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = ApiError::ticket_not_found("TKT-2026-000042");
        assert_eq!(err.message, "Ticket not found");
        assert!(err.detail.unwrap().contains("TKT-2026-000042"));

        let err = ApiError::missing_field("subject");
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("subject"));
    }

    #[test]
    fn test_envelope_omits_absent_detail() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ErrorResponse {
            success: false,
            message: "Ticket not found".to_string(),
            error: None,
        })?;
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("\"error\""));

        let json = serde_json::to_string(&ErrorResponse {
            success: false,
            message: "Failed to create ticket".to_string(),
            error: Some("duplicate key value violates unique constraint".to_string()),
        })?;
        assert!(json.contains("\"error\":\"duplicate key"));
        Ok(())
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ApiError::database_error("Connection failed");
        let rendered = err.to_string();
        assert!(rendered.contains("DatabaseError"));
        assert!(rendered.contains("Connection failed"));
    }

    #[test]
    fn test_ownership_violation_withholds_rows() {
        let err = ApiError::ownership_violation();
        assert_eq!(err.code, ErrorCode::OwnershipViolation);
        assert_eq!(err.detail, None);
        assert_eq!(err.message, "Security error: Invalid ticket access detected");
    }
}
