//! Database Connection Pool Module
//!
//! This module provides PostgreSQL connection pooling using deadpool-postgres
//! and a DbClient wrapper holding every SQL statement the API issues. All
//! queries are parameterized; handlers never see SQL.
//!
//! Multi-step operations that read state to decide a write (ticket number
//! allocation, compliance upsert plus tracker recompute) run inside a single
//! transaction.

use crate::error::{ApiError, ApiResult};
use crate::types::{
    ComplianceResponse, HabitResponse, MessageResponse, RewardResponse, TicketResponse,
    TrackerData, TrackerTotals,
};
use chrono::{Datelike, NaiveDate, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use porter_core::{
    current_streak, CallerIdentity, MessageAuthor, RequesterIdentity, TicketNumber,
    TicketPriority, TicketRef, TicketStatus, Timestamp,
};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "porter".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PORTER_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PORTER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PORTER_DB_NAME").unwrap_or_else(|_| "porter".to_string()),
            user: std::env::var("PORTER_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PORTER_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PORTER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PORTER_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        // Bound both pool size and how long a caller may wait for a
        // connection; a timed-out wait surfaces as a transient failure.
        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        pool_config.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// PARAMETER STRUCTS
// ============================================================================

/// Parameters for ticket creation.
pub struct TicketCreateParams<'a> {
    pub requester: &'a RequesterIdentity,
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub user_phone: &'a str,
    pub subject: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub priority: TicketPriority,
}

/// Validated field updates for a ticket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdateParams {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
}

/// Parameters for a daily compliance upsert.
pub struct ComplianceUpsertParams<'a> {
    pub user_identity: &'a str,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub done: [Option<bool>; 4],
    pub notes: [Option<&'a str>; 4],
    pub score: f64,
}

/// A tracked habit row.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitRecord {
    pub id: Uuid,
    pub user_identity: String,
    pub name: String,
    pub slots_per_day: i16,
}

/// Attempts made to allocate a ticket number before giving up. Collisions
/// only occur under concurrent creation within the same year.
const TICKET_NUMBER_ATTEMPTS: usize = 3;

/// The ownership predicate for the caller's identity scheme.
///
/// Native callers are scoped by the `user_id` column exclusively; foreign
/// callers by the metadata identity entry exclusively. There is no
/// cross-scheme fallback and no path that skips the predicate.
fn owner_predicate(caller: &CallerIdentity) -> &'static str {
    match caller {
        CallerIdentity::Native(_) => "user_id = $1",
        CallerIdentity::Foreign(_) => {
            "metadata IS NOT NULL AND metadata->>'original_user_id' = $1"
        }
    }
}

/// The timestamp side effect of a status transition, if any. Additive:
/// a previously stamped timestamp is overwritten, never cleared.
fn status_timestamp_clause(status: TicketStatus) -> Option<&'static str> {
    match status {
        TicketStatus::Resolved => Some("resolved_at = CURRENT_TIMESTAMP"),
        TicketStatus::Closed => Some("closed_at = CURRENT_TIMESTAMP"),
        TicketStatus::Open | TicketStatus::InProgress => None,
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn ticket_from_row(row: &Row) -> ApiResult<TicketResponse> {
    let status: TicketStatus = row
        .get::<_, String>("status")
        .parse()
        .map_err(|e: String| ApiError::internal_error(format!("Corrupt ticket row: {}", e)))?;
    let priority: TicketPriority = row
        .get::<_, String>("priority")
        .parse()
        .map_err(|e: String| ApiError::internal_error(format!("Corrupt ticket row: {}", e)))?;

    Ok(TicketResponse {
        id: row.get("id"),
        ticket_number: row.get("ticket_number"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        user_phone: row.get("user_phone"),
        subject: row.get("subject"),
        description: row.get("description"),
        status,
        priority,
        category: row.get("category"),
        assigned_to: row.get("assigned_to"),
        assigned_to_name: row.get("assigned_to_name"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        resolved_at: row.get("resolved_at"),
        closed_at: row.get("closed_at"),
        unread_message_count: None,
    })
}

fn message_from_row(row: &Row) -> ApiResult<MessageResponse> {
    let sender_type = row
        .get::<_, String>("sender_type")
        .parse()
        .map_err(|e: String| ApiError::internal_error(format!("Corrupt message row: {}", e)))?;

    Ok(MessageResponse {
        id: row.get("id"),
        ticket_id: row.get("ticket_id"),
        sender_type,
        sender_id: row.get("sender_id"),
        sender_name: row.get("sender_name"),
        message: row.get("message"),
        attachments: row.get("attachments"),
        is_read: row.get("is_read"),
        read_at: row.get("read_at"),
        created_at: row.get("created_at"),
    })
}

fn compliance_from_row(row: &Row) -> ComplianceResponse {
    ComplianceResponse {
        habit_id: row.get("habit_id"),
        compliance_date: row.get("compliance_date"),
        slot1_done: row.get("slot1_done"),
        slot2_done: row.get("slot2_done"),
        slot3_done: row.get("slot3_done"),
        slot4_done: row.get("slot4_done"),
        slot1_note: row.get("slot1_note"),
        slot2_note: row.get("slot2_note"),
        slot3_note: row.get("slot3_note"),
        slot4_note: row.get("slot4_note"),
        compliance_score: row.get("compliance_score"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool and provides the query
/// surface the route handlers use.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    // ========================================================================
    // TICKET OPERATIONS
    // ========================================================================

    /// Create a ticket, allocating the next ticket number for the current
    /// year inside the same transaction.
    ///
    /// The number scan and insert are not atomic against concurrent
    /// creators by themselves; the UNIQUE constraint on `ticket_number`
    /// backstops the race and the allocation is retried on collision, so
    /// callers never observe duplicate numbers.
    pub async fn ticket_create(&self, params: &TicketCreateParams<'_>) -> ApiResult<TicketResponse> {
        let (user_id, metadata) = params.requester.to_storage();
        let status = TicketStatus::Open.to_string();
        let priority = params.priority.to_string();
        let year = Utc::now().year();
        let like_pattern = format!("{}%", TicketNumber::year_prefix(year));

        let mut conn = self.get_conn().await?;
        for attempt in 1..=TICKET_NUMBER_ATTEMPTS {
            let tx = conn.transaction().await?;

            let number_rows = tx
                .query(
                    "SELECT ticket_number FROM tickets WHERE ticket_number LIKE $1",
                    &[&like_pattern],
                )
                .await?;
            let max_existing = number_rows
                .iter()
                .filter_map(|row| TicketNumber::sequence_of(row.get(0), year))
                .max()
                .unwrap_or(0);
            let number = TicketNumber::next(year, max_existing);

            let inserted = tx
                .query_one(
                    "INSERT INTO tickets (\
                        ticket_number, user_id, user_name, user_email, user_phone, \
                        subject, description, status, priority, category, metadata\
                     ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                     RETURNING *",
                    &[
                        &number.as_str(),
                        &user_id,
                        &params.user_name,
                        &params.user_email,
                        &params.user_phone,
                        &params.subject,
                        &params.description,
                        &status,
                        &priority,
                        &params.category,
                        &metadata,
                    ],
                )
                .await;

            match inserted {
                Ok(row) => {
                    tx.commit().await?;
                    return ticket_from_row(&row);
                }
                Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                    tracing::warn!(
                        attempt,
                        number = %number,
                        "Ticket number collision under concurrent creation, retrying"
                    );
                    tx.rollback().await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::database_error(
            "Could not allocate a unique ticket number",
        ))
    }

    /// Resolve a ticket reference to its canonical record.
    ///
    /// Exactly one lookup strategy runs per call: by primary identifier
    /// for native-id-shaped references, by ticket number otherwise.
    pub async fn ticket_locate(&self, reference: &TicketRef) -> ApiResult<Option<TicketResponse>> {
        let conn = self.get_conn().await?;
        let row = match reference {
            TicketRef::ById(id) => {
                conn.query_opt("SELECT * FROM tickets WHERE id = $1", &[id])
                    .await?
            }
            TicketRef::ByNumber(number) => {
                conn.query_opt("SELECT * FROM tickets WHERE ticket_number = $1", &[number])
                    .await?
            }
        };
        row.as_ref().map(ticket_from_row).transpose()
    }

    /// List the caller's tickets, newest first.
    ///
    /// Every returned row is re-verified in-process against the same
    /// identity rule the predicate was built from. A mismatch means the
    /// predicate and verification logic have diverged; the whole result
    /// set is withheld and the request fails.
    pub async fn ticket_list(
        &self,
        caller: &CallerIdentity,
        status: Option<TicketStatus>,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<TicketResponse>> {
        let conn = self.get_conn().await?;

        let status_key = status.map(|s| s.to_string());

        // The native column is UUID-typed, so the parameter keeps the
        // caller's scheme: Uuid for native, text for foreign.
        let caller_param: &(dyn ToSql + Sync) = match caller {
            CallerIdentity::Native(id) => id,
            CallerIdentity::Foreign(key) => key,
        };

        let mut sql = format!("SELECT * FROM tickets WHERE {}", owner_predicate(caller));
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![caller_param];
        if let Some(ref status_key) = status_key {
            params.push(status_key);
            sql.push_str(&format!(" AND status = ${}", params.len()));
        }
        params.push(&limit);
        params.push(&offset);
        sql.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            params.len() - 1,
            params.len()
        ));

        let rows = conn.query(sql.as_str(), &params).await?;
        let tickets: Vec<TicketResponse> =
            rows.iter().map(ticket_from_row).collect::<ApiResult<_>>()?;

        for ticket in &tickets {
            if !ticket.owned_by(caller) {
                tracing::error!(
                    ticket_id = %ticket.id,
                    caller = %caller,
                    "Ownership post-verification mismatch, withholding result set"
                );
                return Err(ApiError::ownership_violation());
            }
        }

        Ok(tickets)
    }

    /// Apply validated field updates to a ticket. Returns `None` when the
    /// ticket does not exist.
    pub async fn ticket_update(
        &self,
        id: Uuid,
        changes: &TicketUpdateParams,
    ) -> ApiResult<Option<TicketResponse>> {
        let status_key = changes.status.map(|s| s.to_string());
        let priority_key = changes.priority.map(|p| p.to_string());

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref status_key) = status_key {
            params.push(status_key);
            sets.push(format!("status = ${}", params.len()));
            if let Some(clause) = changes.status.and_then(status_timestamp_clause) {
                sets.push(clause.to_string());
            }
        }
        if let Some(ref assigned_to) = changes.assigned_to {
            params.push(assigned_to);
            sets.push(format!("assigned_to = ${}", params.len()));
        }
        if let Some(ref assigned_to_name) = changes.assigned_to_name {
            params.push(assigned_to_name);
            sets.push(format!("assigned_to_name = ${}", params.len()));
        }
        if let Some(ref category) = changes.category {
            params.push(category);
            sets.push(format!("category = ${}", params.len()));
        }
        if let Some(ref priority_key) = priority_key {
            params.push(priority_key);
            sets.push(format!("priority = ${}", params.len()));
        }

        if sets.is_empty() {
            return Err(ApiError::validation_failed(
                "No fields to update. Provide at least one: status, assigned_to, \
                 assigned_to_name, category, or priority",
            ));
        }

        sets.push("updated_at = CURRENT_TIMESTAMP".to_string());
        params.push(&id);

        let sql = format!(
            "UPDATE tickets SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            params.len()
        );

        let conn = self.get_conn().await?;
        let row = conn.query_opt(sql.as_str(), &params).await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Append a message to a ticket with resolved authorship, touching the
    /// parent ticket's update timestamp in the same transaction.
    pub async fn message_create(
        &self,
        ticket_id: Uuid,
        author: &MessageAuthor,
        body: &str,
        attachments: &JsonValue,
    ) -> ApiResult<MessageResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_one(
                "INSERT INTO ticket_messages (\
                    ticket_id, sender_type, sender_id, sender_name, message, attachments\
                 ) VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING *",
                &[
                    &ticket_id,
                    &author.kind.as_str(),
                    &author.id,
                    &author.name,
                    &body,
                    attachments,
                ],
            )
            .await?;

        tx.execute(
            "UPDATE tickets SET updated_at = CURRENT_TIMESTAMP WHERE id = $1",
            &[&ticket_id],
        )
        .await?;

        tx.commit().await?;
        message_from_row(&row)
    }

    /// List a ticket's messages in creation order.
    pub async fn message_list(
        &self,
        ticket_id: Uuid,
        since: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<MessageResponse>> {
        let conn = self.get_conn().await?;
        let rows = match since {
            Some(since) => {
                conn.query(
                    "SELECT * FROM ticket_messages \
                     WHERE ticket_id = $1 AND created_at > $2 \
                     ORDER BY created_at ASC LIMIT $3 OFFSET $4",
                    &[&ticket_id, &since, &limit, &offset],
                )
                .await?
            }
            None => {
                conn.query(
                    "SELECT * FROM ticket_messages \
                     WHERE ticket_id = $1 \
                     ORDER BY created_at ASC LIMIT $2 OFFSET $3",
                    &[&ticket_id, &limit, &offset],
                )
                .await?
            }
        };
        rows.iter().map(message_from_row).collect()
    }

    /// All of a ticket's messages in creation order, for the detail view.
    pub async fn message_list_all(&self, ticket_id: Uuid) -> ApiResult<Vec<MessageResponse>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT * FROM ticket_messages \
                 WHERE ticket_id = $1 \
                 ORDER BY created_at ASC",
                &[&ticket_id],
            )
            .await?;
        rows.iter().map(message_from_row).collect()
    }

    /// Count of unread agent messages on a ticket.
    pub async fn message_unread_count(&self, ticket_id: Uuid) -> ApiResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM ticket_messages \
                 WHERE ticket_id = $1 AND is_read = FALSE AND sender_type = 'agent'",
                &[&ticket_id],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Mark messages read. Explicit ids mark exactly those; the bulk path
    /// marks agent messages only, never the requester's own.
    pub async fn messages_mark_read(
        &self,
        ticket_id: Uuid,
        message_ids: Option<&[Uuid]>,
    ) -> ApiResult<u64> {
        let conn = self.get_conn().await?;
        let updated = match message_ids {
            Some(ids) if !ids.is_empty() => {
                conn.execute(
                    "UPDATE ticket_messages \
                     SET is_read = TRUE, read_at = CURRENT_TIMESTAMP \
                     WHERE ticket_id = $1 AND id = ANY($2)",
                    &[&ticket_id, &ids],
                )
                .await?
            }
            _ => {
                conn.execute(
                    "UPDATE ticket_messages \
                     SET is_read = TRUE, read_at = CURRENT_TIMESTAMP \
                     WHERE ticket_id = $1 AND sender_type = 'agent'",
                    &[&ticket_id],
                )
                .await?
            }
        };
        Ok(updated)
    }

    // ========================================================================
    // HABIT OPERATIONS
    // ========================================================================

    /// Fetch a tracked habit.
    pub async fn habit_get(&self, habit_id: Uuid) -> ApiResult<Option<HabitRecord>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, user_identity, name, slots_per_day FROM user_habits WHERE id = $1",
                &[&habit_id],
            )
            .await?;
        Ok(row.map(|row| HabitRecord {
            id: row.get("id"),
            user_identity: row.get("user_identity"),
            name: row.get("name"),
            slots_per_day: row.get("slots_per_day"),
        }))
    }

    /// Upsert one day's compliance and recompute the caller's tracker
    /// totals and reward unlocks, all in one transaction. At most one
    /// record per (identity, habit, day) ever exists.
    pub async fn compliance_upsert(
        &self,
        params: &ComplianceUpsertParams<'_>,
    ) -> ApiResult<ComplianceResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_one(
                "INSERT INTO habit_daily_compliance (\
                    user_identity, habit_id, compliance_date, \
                    slot1_done, slot2_done, slot3_done, slot4_done, \
                    slot1_note, slot2_note, slot3_note, slot4_note, \
                    compliance_score, updated_at\
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, CURRENT_TIMESTAMP) \
                 ON CONFLICT (user_identity, habit_id, compliance_date) DO UPDATE SET \
                    slot1_done = EXCLUDED.slot1_done, slot2_done = EXCLUDED.slot2_done, \
                    slot3_done = EXCLUDED.slot3_done, slot4_done = EXCLUDED.slot4_done, \
                    slot1_note = EXCLUDED.slot1_note, slot2_note = EXCLUDED.slot2_note, \
                    slot3_note = EXCLUDED.slot3_note, slot4_note = EXCLUDED.slot4_note, \
                    compliance_score = EXCLUDED.compliance_score, \
                    updated_at = CURRENT_TIMESTAMP \
                 RETURNING *",
                &[
                    &params.user_identity,
                    &params.habit_id,
                    &params.date,
                    &params.done[0],
                    &params.done[1],
                    &params.done[2],
                    &params.done[3],
                    &params.notes[0],
                    &params.notes[1],
                    &params.notes[2],
                    &params.notes[3],
                    &params.score,
                ],
            )
            .await?;

        // Tracker totals are recomputed from the data rather than
        // incremented, so re-submitting a day cannot double-count it.
        let day_rows = tx
            .query(
                "SELECT compliance_date, BOOL_AND(compliance_score >= 1.0) AS perfect \
                 FROM habit_daily_compliance WHERE user_identity = $1 \
                 GROUP BY compliance_date ORDER BY compliance_date",
                &[&params.user_identity],
            )
            .await?;
        let dates: Vec<NaiveDate> = day_rows.iter().map(|r| r.get("compliance_date")).collect();
        let total_days = dates.len() as i64;
        let perfect_days = day_rows
            .iter()
            .filter(|r| r.get::<_, bool>("perfect"))
            .count() as i64;
        let streak = current_streak(&dates, Utc::now().date_naive()) as i64;

        tx.execute(
            "INSERT INTO habit_trackers (\
                user_identity, total_days_tracked, perfect_days, current_streak, updated_at\
             ) VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP) \
             ON CONFLICT (user_identity) DO UPDATE SET \
                total_days_tracked = EXCLUDED.total_days_tracked, \
                perfect_days = EXCLUDED.perfect_days, \
                current_streak = EXCLUDED.current_streak, \
                updated_at = CURRENT_TIMESTAMP",
            &[&params.user_identity, &total_days, &perfect_days, &streak],
        )
        .await?;

        tx.execute(
            "UPDATE habit_rewards \
             SET unlocked = TRUE, unlocked_at = CURRENT_TIMESTAMP \
             WHERE user_identity = $1 AND NOT unlocked AND threshold_days <= $2",
            &[&params.user_identity, &total_days],
        )
        .await?;

        tx.commit().await?;
        Ok(compliance_from_row(&row))
    }

    /// Aggregate tracker view: running totals, each habit with its
    /// compliance for `today`, and reward unlock states. Unknown users get
    /// empty defaults, not an error.
    pub async fn tracker_view(&self, user_identity: &str, today: NaiveDate) -> ApiResult<TrackerData> {
        let conn = self.get_conn().await?;

        let totals = conn
            .query_opt(
                "SELECT total_days_tracked, perfect_days, current_streak \
                 FROM habit_trackers WHERE user_identity = $1",
                &[&user_identity],
            )
            .await?
            .map(|row| TrackerTotals {
                total_days_tracked: row.get("total_days_tracked"),
                perfect_days: row.get("perfect_days"),
                current_streak: row.get("current_streak"),
            })
            .unwrap_or_default();

        let habit_rows = conn
            .query(
                "SELECT h.id, h.name, h.slots_per_day, \
                        c.habit_id AS today_habit_id, c.compliance_date, \
                        c.slot1_done, c.slot2_done, c.slot3_done, c.slot4_done, \
                        c.slot1_note, c.slot2_note, c.slot3_note, c.slot4_note, \
                        c.compliance_score, c.updated_at \
                 FROM user_habits h \
                 LEFT JOIN habit_daily_compliance c \
                   ON c.habit_id = h.id \
                  AND c.user_identity = h.user_identity \
                  AND c.compliance_date = $2 \
                 WHERE h.user_identity = $1 \
                 ORDER BY h.created_at ASC",
                &[&user_identity, &today],
            )
            .await?;

        let habits = habit_rows
            .iter()
            .map(|row| {
                let today = row
                    .get::<_, Option<Uuid>>("today_habit_id")
                    .map(|habit_id| ComplianceResponse {
                        habit_id,
                        compliance_date: row.get("compliance_date"),
                        slot1_done: row.get("slot1_done"),
                        slot2_done: row.get("slot2_done"),
                        slot3_done: row.get("slot3_done"),
                        slot4_done: row.get("slot4_done"),
                        slot1_note: row.get("slot1_note"),
                        slot2_note: row.get("slot2_note"),
                        slot3_note: row.get("slot3_note"),
                        slot4_note: row.get("slot4_note"),
                        compliance_score: row.get("compliance_score"),
                        updated_at: row.get("updated_at"),
                    });
                HabitResponse {
                    id: row.get("id"),
                    name: row.get("name"),
                    slots_per_day: row.get("slots_per_day"),
                    today,
                }
            })
            .collect();

        let reward_rows = conn
            .query(
                "SELECT id, title, threshold_days, unlocked, unlocked_at \
                 FROM habit_rewards WHERE user_identity = $1 \
                 ORDER BY threshold_days ASC",
                &[&user_identity],
            )
            .await?;
        let rewards = reward_rows
            .iter()
            .map(|row| RewardResponse {
                id: row.get("id"),
                title: row.get("title"),
                threshold_days: row.get("threshold_days"),
                unlocked: row.get("unlocked"),
                unlocked_at: row.get("unlocked_at"),
            })
            .collect();

        Ok(TrackerData {
            user_id: user_identity.to_string(),
            totals,
            habits,
            rewards,
        })
    }
}
