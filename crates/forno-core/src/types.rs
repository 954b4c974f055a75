//! # Domain Types
//!
//! Core domain types used throughout Forno.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Costing                 Register               │
//! │  ─────────               ─────────               ─────────              │
//! │  Ingredient              Recipe                  CashSession            │
//! │  UnitConversion          RecipeItem              Order                  │
//! │  Employee                PriceHistory            OrderItem              │
//! │  Settings                                        PaymentMethod         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an immutable UUID v4 `id` used for relations, plus the
//! human-facing `name` fields operators actually search by.
//!
//! Recipe and Ingredient additionally carry an optimistic `revision`
//! counter: updates must present the revision they read, and a stale write
//! fails with a conflict instead of silently clobbering a concurrent edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Quantity, Rate};
use crate::units::{BaseUnit, Unit};

// =============================================================================
// Ingredient
// =============================================================================

/// What kind of purchased input an ingredient is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    /// Raw material consumed by recipes.
    Raw,
    /// Packaging (boxes, bags, labels).
    Packaging,
    /// Bought finished and sold as-is.
    Resale,
}

impl Default for IngredientCategory {
    fn default() -> Self {
        IngredientCategory::Raw
    }
}

/// A purchased input.
///
/// `cost_per_base_unit` is always derived from the package triple
/// (price, quantity, unit) on save — it is never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this ingredient belongs to.
    pub tenant_id: String,

    /// Display name shown in catalog and recipes.
    pub name: String,

    pub category: IngredientCategory,

    /// Price paid for one purchased package.
    pub package_price: Money,

    /// Package content as printed on the label (e.g. 1 for "1 kg").
    pub package_quantity: Quantity,

    /// Unit the package content is expressed in.
    pub package_unit: Unit,

    /// Canonical unit costs are expressed in (derived from package_unit).
    pub base_unit: BaseUnit,

    /// Derived: package_price / normalized package quantity.
    pub cost_per_base_unit: Money,

    /// Stock on hand, in base units.
    pub current_stock: Quantity,

    /// Reorder threshold, in base units.
    pub minimum_stock: Quantity,

    /// Optimistic concurrency counter, bumped on every update.
    pub revision: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// True when stock has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

/// A named per-ingredient conversion ("cup" → 120 g, "un" → 395 g).
///
/// Consulted when a recipe line is entered in a non-standard unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UnitConversion {
    pub id: String,
    pub ingredient_id: String,
    /// Label as typed on recipe lines (matched case-insensitively).
    pub name: String,
    /// How many base units one entered unit amounts to.
    pub base_units_per_unit: Quantity,
}

// =============================================================================
// Recipe
// =============================================================================

/// What a recipe line references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A purchased ingredient.
    Ingredient,
    /// A base (intermediate) recipe used as a component.
    Recipe,
}

/// A line in a recipe's bill of materials.
///
/// Keeps both the quantity as entered (`quantity` + `unit`) and the
/// resolved `base_quantity` actually used for costing, so the operator's
/// input is never lost to a conversion.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeItem {
    pub id: String,
    pub recipe_id: String,
    pub kind: ComponentKind,
    /// Ingredient id or base recipe id, depending on `kind`.
    pub component_id: String,
    /// Amount as the operator entered it.
    pub quantity: Quantity,
    /// Unit label as entered ("kg", "cup", "un", ...).
    pub unit: String,
    /// Amount in canonical base units, used by the rollup engine.
    pub base_quantity: Quantity,
    /// Display order within the recipe.
    pub position: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A recipe: a bill of materials plus labor, yielding sellable units.
///
/// Cost fields are write-time derived by the rollup engine and cached;
/// the invariant `final_cost = material + labor + overhead` and
/// `unit_cost = final_cost / yield_units` holds on every persisted row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub tenant_id: String,
    pub name: String,

    /// Sellable units one batch produces.
    pub yield_units: Quantity,

    /// Preparation time for one batch, in minutes.
    pub prep_minutes: i64,

    /// Base recipes are intermediates (pastry cream, dough): usable as
    /// components of other recipes, never sold directly.
    pub is_base: bool,

    pub material_cost: Money,
    pub labor_cost: Money,
    pub overhead_cost: Money,
    pub final_cost: Money,
    pub unit_cost: Money,

    /// Operator-set selling price; never auto-changed by recosting.
    pub selling_price: Option<Money>,

    /// Optimistic concurrency counter, bumped on every update.
    pub revision: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Material plus labor, before overhead.
    pub fn prime_cost(&self) -> Money {
        self.material_cost + self.labor_cost
    }
}

// =============================================================================
// Settings & Employees
// =============================================================================

/// An employee on the labor roster. Salaries feed the derived
/// cost-per-minute rate in [`Settings`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Monthly salary.
    pub salary: Money,
    /// Contracted hours per month.
    pub hours_per_month: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Global rates, one row per tenant. Mutated only through an explicit
/// save; every costing call receives them as a parameter instead of
/// reading ambient state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settings {
    pub tenant_id: String,

    /// Derived from the employee roster: Σ salary / (hours × 60).
    pub labor_cost_per_minute: Money,

    /// Percentage of prime cost allocated to fixed expenses.
    pub fixed_overhead_rate: Rate,

    /// Used only to help calibrate the overhead rate.
    pub monthly_revenue_estimate: Money,

    pub default_tax_rate: Rate,
    pub debit_fee_rate: Rate,
    pub credit_fee_rate: Rate,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Zeroed settings for a tenant that has not saved any yet.
    pub fn default_for(tenant_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Settings {
            tenant_id: tenant_id.into(),
            labor_cost_per_minute: Money::zero(),
            fixed_overhead_rate: Rate::zero(),
            monthly_revenue_estimate: Money::zero(),
            default_tax_rate: Rate::zero(),
            debit_fee_rate: Rate::zero(),
            credit_fee_rate: Rate::zero(),
            updated_at: now,
        }
    }
}

// =============================================================================
// Price History
// =============================================================================

/// An immutable audit record of a unit-cost or selling-price change.
/// Append-only: created by the cascade propagator or a manual price edit,
/// never mutated or deleted by normal flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PriceHistory {
    pub id: String,
    pub tenant_id: String,
    pub recipe_id: String,
    pub old_unit_cost: Money,
    pub new_unit_cost: Money,
    pub old_selling_price: Option<Money>,
    pub new_selling_price: Option<Money>,
    /// Free text naming what triggered the change.
    pub reason: String,
    /// Operator id/email the change is attributed to.
    pub changed_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Session
// =============================================================================

/// The status of a cash-drawer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Open
    }
}

/// The bounded period between opening and closing a physical drawer.
///
/// `calculated_balance` is what the system expects in the drawer at close
/// (opening balance + cash sales); `final_balance` is what the operator
/// counted. A mismatch is recorded, not blocked — an explicit verify
/// action later stamps who accepted the discrepancy.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub tenant_id: String,
    pub operator_id: String,
    pub operator_email: String,
    pub status: SessionStatus,
    pub opening_balance: Money,
    pub final_balance: Option<Money>,
    pub calculated_balance: Option<Money>,
    pub notes: Option<String>,
    pub verified_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub verified_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Counted minus expected, once both are known. Positive = surplus.
    pub fn discrepancy(&self) -> Option<Money> {
        match (self.final_balance, self.calculated_balance) {
            (Some(counted), Some(expected)) => Some(counted - expected),
            _ => None,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Closed payment-method taxonomy, assigned at transaction creation.
///
/// Legacy data classified payments by free-text substring match; imported
/// rows go through [`PaymentMethod::from_legacy`] once, at migration time,
/// and the enum is authoritative from then on. `Other` is surfaced in its
/// own settlement bucket rather than silently discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Pix,
    Debit,
    Credit,
    Other,
}

impl PaymentMethod {
    /// Classifies a legacy free-text payment method.
    ///
    /// Case-insensitive substring match, Portuguese and English labels.
    /// Debit is tested before the generic card terms so "cartão de
    /// débito" does not land in Credit.
    pub fn from_legacy(label: &str) -> PaymentMethod {
        let label = label.to_lowercase();

        if label.contains("pix") {
            PaymentMethod::Pix
        } else if label.contains("dinheiro") || label.contains("cash") {
            PaymentMethod::Cash
        } else if label.contains("débito") || label.contains("debito") || label.contains("debit") {
            PaymentMethod::Debit
        } else if label.contains("crédito")
            || label.contains("credito")
            || label.contains("credit")
            || label.contains("cartão")
            || label.contains("cartao")
            || label.contains("card")
        {
            PaymentMethod::Credit
        } else {
            PaymentMethod::Other
        }
    }

    /// Card methods carry an acquirer fee; cash and PIX do not.
    pub const fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::Debit | PaymentMethod::Credit)
    }
}

// =============================================================================
// Order
// =============================================================================

/// What kind of product an order line sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemKind {
    /// A produced recipe.
    Recipe,
    /// A resale ingredient sold as-is.
    Resale,
}

/// A completed sale, settled against a cash session.
///
/// Written atomically together with its items: a sale is never left
/// half-recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub total: Money,
    pub discount: Money,
    pub change_given: Money,
    pub payment_method: PaymentMethod,
    /// Card fee charged by the acquirer (zero for cash/PIX).
    pub fee_amount: Money,
    /// total − fee_amount; always sums back to total with the fee.
    pub net_amount: Money,
    /// Operator the sale is attributed to.
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line item of an order. Description and unit price are frozen at time
/// of sale, so later catalog edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_kind: OrderItemKind,
    /// Product name at time of sale (frozen).
    pub description: String,
    pub quantity: Quantity,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// unit_price × quantity.
    pub line_total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
