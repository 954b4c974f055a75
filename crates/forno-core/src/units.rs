//! # Unit Conversion Module
//!
//! Normalizes purchased-package quantities into canonical base units and
//! derives cost-per-base-unit.
//!
//! ## Canonical Base Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Entered unit          Base unit        Multiplier                     │
//! │   ─────────────         ─────────        ──────────                     │
//! │   kg  (kilogram)   ──►  g  (gram)        × 1000                         │
//! │   g   (gram)       ──►  g  (gram)        × 1                            │
//! │   l   (liter)      ──►  ml (milliliter)  × 1000                         │
//! │   ml  (milliliter) ──►  ml (milliliter)  × 1                            │
//! │   un  (piece)      ──►  un (piece)       × 1                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multipliers are exact integers, so normalization never loses precision.
//! Anything that is not a standard unit ("cup", "colher", a supplier's
//! sack) goes through the ingredient's named conversion table.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{Money, Quantity};
use crate::types::UnitConversion;

// =============================================================================
// Base Unit
// =============================================================================

/// The canonical unit all costs and recipe quantities are normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum BaseUnit {
    /// Mass, in grams.
    #[serde(rename = "g")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "g"))]
    Gram,
    /// Volume, in milliliters.
    #[serde(rename = "ml")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ml"))]
    Milliliter,
    /// Countable pieces.
    #[serde(rename = "un")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "un"))]
    Piece,
}

impl fmt::Display for BaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BaseUnit::Gram => "g",
            BaseUnit::Milliliter => "ml",
            BaseUnit::Piece => "un",
        };
        write!(f, "{label}")
    }
}

// =============================================================================
// Unit
// =============================================================================

/// A standard purchase/entry unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Unit {
    #[serde(rename = "kg")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "kg"))]
    Kilogram,
    #[serde(rename = "g")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "g"))]
    Gram,
    #[serde(rename = "l")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "l"))]
    Liter,
    #[serde(rename = "ml")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ml"))]
    Milliliter,
    #[serde(rename = "un")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "un"))]
    Piece,
}

impl Unit {
    /// Parses a unit label as typed by an operator. Accepts the short
    /// form, the English name, and the Portuguese name.
    pub fn parse(label: &str) -> Option<Unit> {
        match label.trim().to_lowercase().as_str() {
            "kg" | "kilogram" | "quilo" | "quilograma" => Some(Unit::Kilogram),
            "g" | "gram" | "grama" => Some(Unit::Gram),
            "l" | "liter" | "litro" => Some(Unit::Liter),
            "ml" | "milliliter" | "mililitro" => Some(Unit::Milliliter),
            "un" | "und" | "unit" | "unidade" | "piece" | "pc" => Some(Unit::Piece),
            _ => None,
        }
    }

    /// The canonical unit this one normalizes to.
    pub const fn base_unit(&self) -> BaseUnit {
        match self {
            Unit::Kilogram | Unit::Gram => BaseUnit::Gram,
            Unit::Liter | Unit::Milliliter => BaseUnit::Milliliter,
            Unit::Piece => BaseUnit::Piece,
        }
    }

    /// Base units per entered unit. Exact integers only (1 or 1000).
    pub const fn multiplier(&self) -> i64 {
        match self {
            Unit::Kilogram | Unit::Liter => 1000,
            Unit::Gram | Unit::Milliliter | Unit::Piece => 1,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Liter => "l",
            Unit::Milliliter => "ml",
            Unit::Piece => "un",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Normalizes an entered amount into base units.
///
/// ## Example
/// ```rust
/// use forno_core::money::Quantity;
/// use forno_core::units::{base_quantity, Unit};
///
/// // 1 kg → 1000 g
/// assert_eq!(
///     base_quantity(Quantity::from_units(1), Unit::Kilogram),
///     Quantity::from_units(1000)
/// );
/// ```
pub fn base_quantity(quantity: Quantity, unit: Unit) -> Quantity {
    quantity * unit.multiplier()
}

/// Derives the cost per base unit of a purchased package.
///
/// ## Contract
/// `base_cost(price, package_quantity, package_unit)` returns the cost of
/// one gram / milliliter / piece, plus the base unit it is expressed in.
/// If the normalized package quantity is not positive the cost is exactly
/// zero — malformed package data degrades, it never divides by zero.
///
/// ## Example
/// ```rust
/// use forno_core::money::{Money, Quantity};
/// use forno_core::units::{base_cost, BaseUnit, Unit};
///
/// // R$20.00 per 1 kg package → R$0.0200/g
/// let (cost, base) = base_cost(Money::from_units(20), Quantity::from_units(1), Unit::Kilogram);
/// assert_eq!(cost, Money::from_scaled(200));
/// assert_eq!(base, BaseUnit::Gram);
/// ```
pub fn base_cost(price: Money, package_quantity: Quantity, package_unit: Unit) -> (Money, BaseUnit) {
    let base = package_unit.base_unit();
    let total_base_units = base_quantity(package_quantity, package_unit);

    if !total_base_units.is_positive() {
        return (Money::zero(), base);
    }

    (price.div_quantity(total_base_units), base)
}

// =============================================================================
// Recipe-Line Resolution
// =============================================================================

/// A recipe line whose entered unit could not be resolved.
///
/// The raw quantity is used unconverted in that case; the gap is surfaced
/// to the operator as a data-integrity warning because an unresolved unit
/// can silently misprice the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConversionGap {
    /// The unit label as the operator entered it.
    pub unit: String,
}

/// Translates a recipe-line quantity into base units.
///
/// ## Resolution Order
/// 1. Standard units (kg/g/l/ml/un) convert by their exact multiplier.
/// 2. Otherwise the ingredient's named conversion table is consulted,
///    case-insensitively ("Cup" matches a conversion named "cup").
/// 3. Otherwise the raw quantity passes through unconverted, with a
///    [`ConversionGap`] for the caller to surface.
pub fn resolve_quantity(
    quantity: Quantity,
    unit_label: &str,
    conversions: &[UnitConversion],
) -> (Quantity, Option<ConversionGap>) {
    if let Some(unit) = Unit::parse(unit_label) {
        return (base_quantity(quantity, unit), None);
    }

    let wanted = unit_label.trim().to_lowercase();
    if let Some(conversion) = conversions
        .iter()
        .find(|c| c.name.trim().to_lowercase() == wanted)
    {
        return (quantity.mul(conversion.base_units_per_unit), None);
    }

    (
        quantity,
        Some(ConversionGap {
            unit: unit_label.trim().to_string(),
        }),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
