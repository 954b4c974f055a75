//! # Cash Session Repository
//!
//! Database operations for cash drawer sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Lifecycle                                  │
//! │                                                                         │
//! │  1. OPEN REGISTER                                                      │
//! │     └── insert() → CashSession { status: Open }                        │
//! │         (unique partial index guarantees one open per operator)        │
//! │                                                                         │
//! │  2. SALES SETTLE AGAINST THE SESSION                                   │
//! │     └── orders.session_id → this session                               │
//! │                                                                         │
//! │  3. CLOSE REGISTER                                                     │
//! │     └── close() → stores counted AND calculated balance                │
//! │         (a discrepancy is data, not an error)                          │
//! │                                                                         │
//! │  4. (OPTIONAL) VERIFY / FORCE CLOSE                                    │
//! │     └── verify() → stamps who accepted the discrepancy                 │
//! │     └── close_verified() → admin close at calculated balance          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use forno_core::{CashSession, Money};

const SESSION_COLUMNS: &str = "id, tenant_id, operator_id, operator_email, status, \
     opening_balance, final_balance, calculated_balance, notes, \
     verified_by, verified_at, opened_at, closed_at";

/// Repository for cash session database operations.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    pool: SqlitePool,
}

impl CashSessionRepository {
    /// Creates a new CashSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashSessionRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Finds the open session of an operator, if any.
    pub async fn find_open_for(&self, operator_id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE operator_id = ?1 AND status = 'open'"
        ))
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Lists recent sessions of a tenant, newest first.
    pub async fn list_recent(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE tenant_id = ?1 ORDER BY opened_at DESC LIMIT ?2"
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Inserts a newly opened session.
    ///
    /// The `idx_one_open_session` partial unique index rejects a second
    /// open row for the same operator even under racing inserts.
    pub async fn insert(&self, session: &CashSession) -> DbResult<()> {
        debug!(id = %session.id, operator = %session.operator_id, "Opening cash session");

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, tenant_id, operator_id, operator_email, status,
                opening_balance, final_balance, calculated_balance, notes,
                verified_by, verified_at, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&session.id)
        .bind(&session.tenant_id)
        .bind(&session.operator_id)
        .bind(&session.operator_email)
        .bind(session.status)
        .bind(session.opening_balance)
        .bind(session.final_balance)
        .bind(session.calculated_balance)
        .bind(&session.notes)
        .bind(&session.verified_by)
        .bind(session.verified_at)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes an open session, storing both the operator-counted and the
    /// system-calculated balance. Fails if the session is not open.
    pub async fn close(
        &self,
        id: &str,
        final_balance: Money,
        calculated_balance: Money,
        notes: Option<&str>,
        closed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = 'closed',
                final_balance = ?2,
                calculated_balance = ?3,
                notes = ?4,
                closed_at = ?5
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(final_balance)
        .bind(calculated_balance)
        .bind(notes)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash session (open)", id));
        }

        Ok(())
    }

    /// Closes an open session at the calculated balance and marks it
    /// verified in the same statement (administrative force-close).
    pub async fn close_verified(
        &self,
        id: &str,
        calculated_balance: Money,
        approver: &str,
        closed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = 'closed',
                final_balance = ?2,
                calculated_balance = ?2,
                verified_by = ?3,
                verified_at = ?4,
                closed_at = ?4
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(calculated_balance)
        .bind(approver)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash session (open)", id));
        }

        Ok(())
    }

    /// Stamps who/when accepted a closed session's discrepancy.
    pub async fn verify(
        &self,
        id: &str,
        approver: &str,
        verified_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE cash_sessions SET verified_by = ?2, verified_at = ?3 \
             WHERE id = ?1 AND status = 'closed'",
        )
        .bind(id)
        .bind(approver)
        .bind(verified_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash session (closed)", id));
        }

        Ok(())
    }
}
