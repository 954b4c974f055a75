//! # Service Module
//!
//! Orchestration services composing repositories with the forno-core
//! engines. This is the API UI layers call:
//!
//! - [`catalog`] - ingredient/recipe/settings save paths (validation,
//!   cost derivation, cycle guard, manual price history)
//! - [`cascade`] - recost propagation after an ingredient/base change
//! - [`register`] - cash session open/close/verify/force-close
//! - [`checkout`] - atomic sale recording
//!
//! Services receive the operator identity as a parameter (an external
//! identity provider owns authentication) and read time from an injected
//! [`Clock`], so every flow is reproducible in tests.

pub mod cascade;
pub mod catalog;
pub mod checkout;
pub mod register;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::DbError;
use forno_core::{CoreError, ValidationError};

pub use cascade::{CascadeFailure, CascadePropagator, CascadeReport, CascadeTrigger, RecostOutcome};
pub use catalog::{IngredientService, RecipeService, SettingsService};
pub use checkout::CheckoutService;
pub use register::CashSessionService;

// =============================================================================
// Clock
// =============================================================================

/// Injected time source. Production uses [`SystemClock`]; tests pin a
/// fixed instant to make timestamps assertable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared handle type services hold.
pub type SharedClock = Arc<dyn Clock>;

// =============================================================================
// Service Error
// =============================================================================

/// What callers of the service layer see: domain violations or database
/// failures, each keeping its own typed detail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
