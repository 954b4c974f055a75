//! # forno-db: Database Layer for Forno
//!
//! This crate provides database access and service orchestration for the
//! Forno costing and settlement engine. It uses SQLite for local storage
//! with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Forno Data Flow                                 │
//! │                                                                         │
//! │  UI action (save ingredient / close register / ring up sale)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     forno-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service/*)   │───►│ (repository/*)│    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ catalog       │    │ ingredient    │    │ 001_init.sql │  │   │
//! │  │   │ cascade       │    │ recipe        │    │ ...          │  │   │
//! │  │   │ register      │    │ session       │    │              │  │   │
//! │  │   │ checkout      │    │ order, ...    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │ pure math          │ SQL                           │   │
//! │  │           ▼                    ▼                               │   │
//! │  │      forno-core           SQLite (WAL)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per aggregate
//! - [`service`] - Catalog/cascade/register/checkout orchestration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forno_db::{Database, DbConfig};
//! use forno_db::service::IngredientService;
//!
//! let db = Database::new(DbConfig::new("path/to/forno.db")).await?;
//! let result = IngredientService::new(db.clone())
//!     .save(draft, "operator@shop")
//!     .await?;
//! println!("recosted {} recipes", result.cascade.applied.len());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{ServiceError, ServiceResult};
