//! # Cash Register Service
//!
//! Session open/close/verify orchestration. The arithmetic (buckets,
//! expected cash) is forno-core's settlement module; this service owns
//! the lifecycle rules:
//!
//! - one open session per operator, enforced at open
//! - closing records the discrepancy, it never blocks on one
//! - verification is a separate, attributed act
//! - force-close is the administrative escape hatch when the assigned
//!   operator cannot close their own drawer

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::service::{Clock, ServiceError, ServiceResult, SharedClock, SystemClock};
use forno_core::settlement::{expected_cash, summarize};
use forno_core::{
    CashSession, CoreError, Money, SessionStatus, SessionSummary, DEFAULT_TENANT_ID,
};

/// Result of closing a session: the stored row plus the settlement
/// figures it was closed against.
#[derive(Debug)]
pub struct SessionCloseResult {
    pub session: CashSession,
    pub summary: SessionSummary,
    /// Counted minus expected. Zero for force-closes by construction.
    pub discrepancy: Money,
}

/// Service for cash drawer sessions.
#[derive(Clone)]
pub struct CashSessionService {
    db: Database,
    clock: SharedClock,
}

impl CashSessionService {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        CashSessionService { db, clock }
    }

    /// Opens the register for an operator.
    ///
    /// Check-then-create against the open-session rule; the partial
    /// unique index turns any racing second insert into the same
    /// [`CoreError::SessionAlreadyOpen`].
    pub async fn open_session(
        &self,
        operator_id: &str,
        operator_email: &str,
        opening_balance: Money,
    ) -> ServiceResult<CashSession> {
        let repo = self.db.sessions();

        if repo.find_open_for(operator_id).await?.is_some() {
            return Err(CoreError::SessionAlreadyOpen {
                operator_id: operator_id.to_string(),
            }
            .into());
        }

        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            operator_id: operator_id.to_string(),
            operator_email: operator_email.to_string(),
            status: SessionStatus::Open,
            opening_balance,
            final_balance: None,
            calculated_balance: None,
            notes: None,
            verified_by: None,
            verified_at: None,
            opened_at: self.clock.now(),
            closed_at: None,
        };

        match repo.insert(&session).await {
            Ok(()) => {}
            // lost the race to another open attempt: same domain error
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::SessionAlreadyOpen {
                    operator_id: operator_id.to_string(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(id = %session.id, operator = %operator_id, "Cash session opened");
        Ok(session)
    }

    /// Settlement figures of a session's completed orders, on demand
    /// (the register screen shows them while the session is still open).
    pub async fn session_summary(&self, session_id: &str) -> ServiceResult<SessionSummary> {
        let orders = self.db.orders().list_for_session(session_id).await?;
        Ok(summarize(&orders))
    }

    /// Closes the register against a physical cash count.
    ///
    /// Stores both the expected (`calculated_balance`) and the counted
    /// (`final_balance`) amount. A discrepancy is recorded and reported —
    /// resolving it is a later, explicit verification.
    pub async fn close_session(
        &self,
        session_id: &str,
        counted_cash: Money,
        notes: Option<String>,
    ) -> ServiceResult<SessionCloseResult> {
        let session = self.require_session(session_id).await?;
        if !session.is_open() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                status: "closed".to_string(),
            }
            .into());
        }

        let orders = self.db.orders().list_for_session(session_id).await?;
        let summary = summarize(&orders);
        let expected = expected_cash(session.opening_balance, &summary);

        self.db
            .sessions()
            .close(
                session_id,
                counted_cash,
                expected,
                notes.as_deref(),
                self.clock.now(),
            )
            .await?;

        let session = self.require_session(session_id).await?;
        let discrepancy = counted_cash - expected;

        info!(
            id = %session_id,
            expected = %expected,
            counted = %counted_cash,
            discrepancy = %discrepancy,
            "Cash session closed"
        );

        Ok(SessionCloseResult {
            session,
            summary,
            discrepancy,
        })
    }

    /// Stamps who accepted a closed session's discrepancy, and when.
    pub async fn verify_session(
        &self,
        session_id: &str,
        approver: &str,
    ) -> ServiceResult<CashSession> {
        self.db
            .sessions()
            .verify(session_id, approver, self.clock.now())
            .await?;

        self.require_session(session_id).await
    }

    /// Administrative close on behalf of an absent operator: the
    /// calculated balance is stored as both expected and counted (zero
    /// discrepancy by construction) and the approver verifies in the
    /// same act.
    pub async fn force_close(
        &self,
        session_id: &str,
        approver: &str,
    ) -> ServiceResult<SessionCloseResult> {
        let session = self.require_session(session_id).await?;
        if !session.is_open() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                status: "closed".to_string(),
            }
            .into());
        }

        let orders = self.db.orders().list_for_session(session_id).await?;
        let summary = summarize(&orders);
        let expected = expected_cash(session.opening_balance, &summary);

        self.db
            .sessions()
            .close_verified(session_id, expected, approver, self.clock.now())
            .await?;

        let session = self.require_session(session_id).await?;

        info!(id = %session_id, approver = %approver, "Cash session force-closed");

        Ok(SessionCloseResult {
            session,
            summary,
            discrepancy: Money::zero(),
        })
    }

    async fn require_session(&self, session_id: &str) -> Result<CashSession, ServiceError> {
        Ok(self
            .db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cash session", session_id))?)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================
