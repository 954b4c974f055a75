//! # forno-core: Pure Business Logic for Forno
//!
//! This crate is the **heart** of Forno. It contains all costing and
//! settlement logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Forno Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Frontend (out of tree)                     │   │
//! │  │    Catalog UI ──► Recipe UI ──► Register UI ──► Reports UI     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    forno-db (services + repos)                  │   │
//! │  │    save_recipe, propagate, open_session, process_sale, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ forno-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   units   │  │  rollup   │  │  pricing  │  │   │
//! │  │   │   Money   │  │ base_cost │  │ CostBreak │  │  quotes   │  │   │
//! │  │   │ Rate/Qty  │  │ resolve   │  │   down    │  │  margins  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │settlement │  │   deps    │  │   types   │                 │   │
//! │  │   │  buckets  │  │  cycles   │  │  entities │                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Fixed-point Money/Rate/Quantity arithmetic (no floats!)
//! - [`units`] - Unit normalization and cost-per-base-unit derivation
//! - [`types`] - Domain types (Ingredient, Recipe, CashSession, ...)
//! - [`rollup`] - Cost rollup engine (material/labor/overhead/unit cost)
//! - [`pricing`] - Margin ⇄ price simulator with the safety ceiling
//! - [`settlement`] - Payment buckets, fees, expected-cash math
//! - [`deps`] - Recipe dependency graph cycle detection
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, clock access is FORBIDDEN here
//! 3. **Fixed-Point Money**: All monetary values are scaled i64 to avoid float errors
//! 4. **Explicit Settings**: Global rates are parameters, never ambient state
//!
//! ## Example Usage
//!
//! ```rust
//! use forno_core::money::{Money, Quantity, Rate};
//! use forno_core::units::{base_cost, Unit};
//!
//! // R$20.00 for a 1 kg package of flour
//! let (per_gram, _base) =
//!     base_cost(Money::from_units(20), Quantity::from_units(1), Unit::Kilogram);
//!
//! // 500 g of it in a recipe costs R$10.00
//! assert_eq!(per_gram.mul_quantity(Quantity::from_units(500)), Money::from_units(10));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod deps;
pub mod error;
pub mod money;
pub mod pricing;
pub mod rollup;
pub mod settlement;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use forno_core::Money` instead of
// `use forno_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Quantity, Rate, SignedRate};
pub use rollup::CostBreakdown;
pub use settlement::{FeeBreakdown, SessionSummary};
pub use types::*;
pub use units::{BaseUnit, Unit};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-tenant runtime with multi-tenant schema)
///
/// v0.1 is single-tenant, but every table carries tenant_id for future
/// multi-tenancy. This constant is used throughout the codebase and will
/// be replaced with dynamic tenant resolution later.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Unit-cost change below this threshold leaves a recipe untouched during
/// cascade propagation: R$0.01, the smallest operator-visible difference.
/// Keeps rounding residue from generating noise history rows.
pub const RECOST_TOLERANCE: Money = Money::from_scaled(100);

/// Upper bound on base-recipe chain depth the cascade will follow.
/// Real catalogs nest two or three levels; the bound only matters for
/// corrupt (cyclic) data that predates the save-time cycle guard.
pub const MAX_CASCADE_DEPTH: usize = 32;

/// Maximum line items in a single recipe or sale.
pub const MAX_ITEMS: usize = 200;
