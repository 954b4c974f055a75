//! # Cost Rollup Engine
//!
//! Turns a bill of materials into material/labor/overhead/final/unit cost.
//!
//! ## Cost Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  recipe items ──► material = Σ base_quantity × cost_per_base_unit      │
//! │                              (or base recipe unit_cost)                 │
//! │  prep minutes ──► labor    = minutes × settings.labor_cost_per_minute  │
//! │                                                                         │
//! │                   prime    = material + labor                           │
//! │                   overhead = prime × fixed_overhead_rate                │
//! │                   final    = prime + overhead                           │
//! │                   unit     = final / yield   (0 when yield ≤ 0)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step is fixed-point arithmetic — never float accumulation with a
//! final rounding — so dozens of small ingredient lines cannot drift a
//! cent. The engine is a pure function: no I/O, no clock, deterministic
//! for identical inputs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Quantity};
use crate::types::{ComponentKind, Employee, RecipeItem, Settings};

// =============================================================================
// Result Types
// =============================================================================

/// A recipe line whose referent no longer exists in the catalog.
///
/// The line contributes zero to material cost but is reported, not
/// dropped: the operator must see "excluded" items without losing the
/// historical quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrphanedComponent {
    pub kind: ComponentKind,
    pub component_id: String,
    pub base_quantity: Quantity,
}

/// The derived cost fields of one rollup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    pub material_cost: Money,
    pub labor_cost: Money,
    pub overhead_cost: Money,
    pub final_cost: Money,
    pub unit_cost: Money,
    /// Data-integrity warnings: lines excluded from material cost.
    pub orphans: Vec<OrphanedComponent>,
}

impl CostBreakdown {
    /// Material plus labor, before overhead.
    pub fn prime_cost(&self) -> Money {
        self.material_cost + self.labor_cost
    }

    pub fn has_warnings(&self) -> bool {
        !self.orphans.is_empty()
    }
}

// =============================================================================
// Rollup
// =============================================================================

/// Computes the full cost breakdown for one recipe.
///
/// ## Arguments
/// * `items` - the recipe's bill of materials, base quantities resolved
/// * `ingredient_costs` - ingredient id → cost per base unit
/// * `base_unit_costs` - base recipe id → that recipe's stored unit cost
/// * `prep_minutes` - preparation time for one batch
/// * `yield_units` - sellable units one batch produces
/// * `settings` - global labor/overhead rates, passed explicitly
///
/// ## Guarantees
/// - `final_cost = material + labor + overhead`, exactly
/// - `unit_cost = final / yield`, or zero when `yield ≤ 0`
/// - items missing from their lookup contribute zero and are reported in
///   `orphans`; the rollup itself never fails
pub fn rollup(
    items: &[RecipeItem],
    ingredient_costs: &HashMap<String, Money>,
    base_unit_costs: &HashMap<String, Money>,
    prep_minutes: i64,
    yield_units: Quantity,
    settings: &Settings,
) -> CostBreakdown {
    let mut material_cost = Money::zero();
    let mut orphans = Vec::new();

    for item in items {
        let lookup = match item.kind {
            ComponentKind::Ingredient => ingredient_costs,
            ComponentKind::Recipe => base_unit_costs,
        };

        match lookup.get(&item.component_id) {
            Some(unit_cost) => {
                material_cost += unit_cost.mul_quantity(item.base_quantity);
            }
            None => {
                orphans.push(OrphanedComponent {
                    kind: item.kind,
                    component_id: item.component_id.clone(),
                    base_quantity: item.base_quantity,
                });
            }
        }
    }

    let labor_cost = settings.labor_cost_per_minute * prep_minutes.max(0);
    let prime = material_cost + labor_cost;
    let overhead_cost = prime.apply_rate(settings.fixed_overhead_rate);
    let final_cost = prime + overhead_cost;
    let unit_cost = final_cost.div_quantity(yield_units);

    CostBreakdown {
        material_cost,
        labor_cost,
        overhead_cost,
        final_cost,
        unit_cost,
        orphans,
    }
}

/// Derives the global labor cost per minute from the employee roster:
/// Σ salary / (hours × 60). Employees with non-positive hours contribute
/// zero rather than poisoning the rate.
pub fn cost_per_minute(employees: &[Employee]) -> Money {
    employees
        .iter()
        .fold(Money::zero(), |acc, employee| {
            acc + employee.salary.div_units(employee.hours_per_month * 60)
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
