//! Habit Compliance REST API Routes
//!
//! Axum route handlers for the daily habit-compliance tracker: one upsert
//! per (caller, habit, day) and an aggregate per-user tracker view.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    db::{ComplianceUpsertParams, DbClient},
    error::{ApiError, ApiResult, ErrorResponse},
    types::{ComplianceEnvelope, TrackerEnvelope, UpsertComplianceRequest},
};
use porter_core::{compliance_score, CallerIdentity};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for habit routes.
#[derive(Clone)]
pub struct HabitState {
    pub db: DbClient,
}

impl HabitState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/habits/daily-compliance - Upsert one day's compliance
#[utoipa::path(
    post,
    path = "/api/v1/habits/daily-compliance",
    tag = "Habits",
    request_body = UpsertComplianceRequest,
    responses(
        (status = 200, description = "Compliance recorded", body = ComplianceEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Caller identity missing", body = ErrorResponse),
        (status = 404, description = "Habit not found", body = ErrorResponse),
    ),
)]
pub async fn upsert_daily_compliance(
    State(state): State<Arc<HabitState>>,
    Json(req): Json<UpsertComplianceRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller = req
        .user_id
        .as_deref()
        .and_then(CallerIdentity::classify)
        .ok_or_else(|| {
            ApiError::authentication_required(
                "Authentication required. Please log in to record compliance.",
            )
        })?;
    let habit_id = req
        .habit_id
        .ok_or_else(|| ApiError::missing_field("habit_id"))?;

    let habit = state
        .db
        .habit_get(habit_id)
        .await?
        .ok_or_else(|| ApiError::habit_not_found(habit_id))?;

    // Another identity's habit is indistinguishable from a missing one.
    if habit.user_identity != caller.to_string() {
        return Err(ApiError::habit_not_found(habit_id));
    }

    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let done = req.done_flags();
    let score = compliance_score(&done, habit.slots_per_day.clamp(1, 4) as u8);

    let caller_key = caller.to_string();
    let compliance = state
        .db
        .compliance_upsert(&ComplianceUpsertParams {
            user_identity: &caller_key,
            habit_id,
            date,
            done,
            notes: [
                req.slot1_note.as_deref(),
                req.slot2_note.as_deref(),
                req.slot3_note.as_deref(),
                req.slot4_note.as_deref(),
            ],
            score,
        })
        .await?;

    Ok(Json(ComplianceEnvelope::new(compliance)))
}

/// GET /api/v1/habits/tracker/{user_id} - Aggregate tracker view
#[utoipa::path(
    get,
    path = "/api/v1/habits/tracker/{user_id}",
    tag = "Habits",
    params(
        ("user_id" = String, Path, description = "Caller identity (native id or foreign identity string)"),
    ),
    responses(
        (status = 200, description = "Aggregate tracker view", body = TrackerEnvelope),
        (status = 401, description = "Caller identity missing", body = ErrorResponse),
    ),
)]
pub async fn get_tracker(
    State(state): State<Arc<HabitState>>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caller = CallerIdentity::classify(&user_id).ok_or_else(|| {
        ApiError::authentication_required(
            "Authentication required. Please log in to view your tracker.",
        )
    })?;

    let data = state
        .db
        .tracker_view(&caller.to_string(), Utc::now().date_naive())
        .await?;

    Ok(Json(TrackerEnvelope::new(data)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the habit routes router.
pub fn create_router(db: DbClient) -> axum::Router {
    let state = Arc::new(HabitState::new(db));

    axum::Router::new()
        .route(
            "/daily-compliance",
            axum::routing::post(upsert_daily_compliance),
        )
        .route("/tracker/:user_id", axum::routing::get(get_tracker))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_request_defaults_date() {
        let req: UpsertComplianceRequest = serde_json::from_str(
            r#"{"user_id": "gid://shopify/Customer/123",
                "habit_id": "550e8400-e29b-41d4-a716-446655440000",
                "slot1_done": true}"#,
        )
        .unwrap();
        assert!(req.date.is_none());
        assert_eq!(req.done_flags()[0], Some(true));
    }

    #[test]
    fn test_score_follows_habit_slot_count() {
        let done = [Some(true), Some(true), None, None];
        assert_eq!(compliance_score(&done, 4), 0.5);
        assert_eq!(compliance_score(&done, 2), 1.0);
    }
}
