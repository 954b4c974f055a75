//! # Catalog Services
//!
//! Save paths for ingredients, recipes and settings. These are the only
//! writers of derived data: cost-per-base-unit on ingredients, the five
//! cost fields on recipes, and the labor rate on settings all get
//! recomputed here on every save — never edited directly.
//!
//! ## Save-Path Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  save_ingredient ──► validate ──► derive base cost ──► persist         │
//! │                                        │                                │
//! │                                        └──► cascade dependents         │
//! │                                                                         │
//! │  save_recipe ──► validate ──► base-only + cycle guard                  │
//! │                     │                                                   │
//! │                     ├──► resolve units (conversion gaps surfaced)      │
//! │                     ├──► rollup ──► persist row + items                │
//! │                     ├──► manual price change → history row             │
//! │                     └──► base recipe cost moved → cascade              │
//! │                                                                         │
//! │  save_settings ──► validate rates ──► replace roster                   │
//! │                          └──► derive labor cost/minute                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::pool::Database;
use crate::service::cascade::{CascadePropagator, CascadeReport, CascadeTrigger};
use crate::service::{Clock, ServiceResult, SharedClock, SystemClock};
use forno_core::rollup::{cost_per_minute, rollup, CostBreakdown};
use forno_core::units::{base_cost, resolve_quantity};
use forno_core::validation::{
    validate_items_not_empty, validate_name, validate_prep_minutes, validate_rate, validate_yield,
};
use forno_core::{
    deps, ComponentKind, CoreError, Employee, Ingredient, IngredientCategory, Money, PriceHistory,
    Quantity, Rate, Recipe, RecipeItem, Settings, Unit, UnitConversion, DEFAULT_TENANT_ID,
    MAX_ITEMS, RECOST_TOLERANCE,
};

// =============================================================================
// Ingredient Service
// =============================================================================

/// Input for an ingredient save. `id = None` creates; otherwise updates,
/// and `expected_revision` must carry the revision the editor read.
#[derive(Debug, Clone)]
pub struct IngredientDraft {
    pub id: Option<String>,
    pub expected_revision: i64,
    pub name: String,
    pub category: IngredientCategory,
    pub package_price: Money,
    pub package_quantity: Quantity,
    pub package_unit: Unit,
    pub current_stock: Quantity,
    pub minimum_stock: Quantity,
    pub conversions: Vec<ConversionDraft>,
}

/// One named conversion on an ingredient draft.
#[derive(Debug, Clone)]
pub struct ConversionDraft {
    pub name: String,
    pub base_units_per_unit: Quantity,
}

/// Result of an ingredient save: the stored row plus whatever the price
/// change cascaded into.
#[derive(Debug)]
pub struct IngredientSaveResult {
    pub ingredient: Ingredient,
    pub cascade: CascadeReport,
}

/// Service for ingredient maintenance.
#[derive(Clone)]
pub struct IngredientService {
    db: Database,
    clock: SharedClock,
}

impl IngredientService {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        IngredientService { db, clock }
    }

    /// Creates or updates an ingredient.
    ///
    /// The cost per base unit is derived from the package triple here —
    /// on every save, unconditionally. When the derived cost of an
    /// existing ingredient moves, every dependent recipe is recosted
    /// before this returns, and the cascade report says what happened.
    pub async fn save(
        &self,
        draft: IngredientDraft,
        actor: &str,
    ) -> ServiceResult<IngredientSaveResult> {
        validate_name("name", &draft.name)?;

        let (cost_per_base_unit, base_unit) =
            base_cost(draft.package_price, draft.package_quantity, draft.package_unit);

        let now = self.clock.now();
        let repo = self.db.ingredients();

        let (ingredient, cost_changed) = match draft.id {
            None => {
                let ingredient = Ingredient {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: DEFAULT_TENANT_ID.to_string(),
                    name: draft.name.trim().to_string(),
                    category: draft.category,
                    package_price: draft.package_price,
                    package_quantity: draft.package_quantity,
                    package_unit: draft.package_unit,
                    base_unit,
                    cost_per_base_unit,
                    current_stock: draft.current_stock,
                    minimum_stock: draft.minimum_stock,
                    revision: 0,
                    created_at: now,
                    updated_at: now,
                };
                repo.insert(&ingredient).await?;
                // a brand-new ingredient has no dependents yet
                (ingredient, false)
            }
            Some(id) => {
                let existing = repo
                    .get_by_id(&id)
                    .await?
                    .ok_or_else(|| crate::error::DbError::not_found("Ingredient", &id))?;

                let ingredient = Ingredient {
                    id: id.clone(),
                    tenant_id: existing.tenant_id.clone(),
                    name: draft.name.trim().to_string(),
                    category: draft.category,
                    package_price: draft.package_price,
                    package_quantity: draft.package_quantity,
                    package_unit: draft.package_unit,
                    base_unit,
                    cost_per_base_unit,
                    current_stock: draft.current_stock,
                    minimum_stock: draft.minimum_stock,
                    revision: draft.expected_revision + 1,
                    created_at: existing.created_at,
                    updated_at: now,
                };
                repo.update(&ingredient, draft.expected_revision).await?;

                (ingredient, existing.cost_per_base_unit != cost_per_base_unit)
            }
        };

        let conversions: Vec<UnitConversion> = draft
            .conversions
            .iter()
            .map(|c| UnitConversion {
                id: Uuid::new_v4().to_string(),
                ingredient_id: ingredient.id.clone(),
                name: c.name.trim().to_string(),
                base_units_per_unit: c.base_units_per_unit,
            })
            .collect();
        repo.replace_conversions(&ingredient.id, &conversions).await?;

        let cascade = if cost_changed {
            info!(id = %ingredient.id, name = %ingredient.name, "Ingredient cost changed, cascading");
            CascadePropagator::with_clock(self.db.clone(), self.clock.clone())
                .propagate(
                    CascadeTrigger::Ingredient {
                        id: ingredient.id.clone(),
                        name: ingredient.name.clone(),
                    },
                    actor,
                )
                .await?
        } else {
            CascadeReport::default()
        };

        Ok(IngredientSaveResult { ingredient, cascade })
    }

    /// Deletes an ingredient, blocked while any recipe item references it.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let references = self.db.ingredients().reference_count(id).await?;
        if references > 0 {
            return Err(CoreError::IngredientInUse {
                id: id.to_string(),
                references,
            }
            .into());
        }

        self.db.ingredients().delete(id).await?;
        Ok(())
    }
}

// =============================================================================
// Recipe Service
// =============================================================================

/// One bill-of-materials line on a recipe draft.
#[derive(Debug, Clone)]
pub struct RecipeItemDraft {
    pub kind: ComponentKind,
    pub component_id: String,
    pub quantity: Quantity,
    /// Unit label as entered; resolved against standard units and the
    /// ingredient's conversion table.
    pub unit: String,
}

/// Input for a recipe save.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub id: Option<String>,
    pub expected_revision: i64,
    pub name: String,
    pub yield_units: Quantity,
    pub prep_minutes: i64,
    pub is_base: bool,
    pub selling_price: Option<Money>,
    /// Reason recorded when this save changes the selling price.
    pub price_reason: Option<String>,
    pub items: Vec<RecipeItemDraft>,
}

/// A recipe line whose entered unit had no conversion: costed with the
/// raw quantity, surfaced for the operator to fix.
#[derive(Debug, Clone)]
pub struct LineWarning {
    pub component_id: String,
    pub unit: String,
}

/// Result of a recipe save.
#[derive(Debug)]
pub struct RecipeSaveResult {
    pub recipe: Recipe,
    pub breakdown: CostBreakdown,
    pub conversion_gaps: Vec<LineWarning>,
    /// Non-empty when this save moved a base recipe's unit cost and
    /// dependents were recosted.
    pub cascade: CascadeReport,
}

/// Service for recipe maintenance.
#[derive(Clone)]
pub struct RecipeService {
    db: Database,
    clock: SharedClock,
}

impl RecipeService {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        RecipeService { db, clock }
    }

    /// Creates or updates a recipe: validates, guards the base-recipe
    /// graph, resolves entered units, rolls costs up and persists
    /// everything the display layer reads.
    pub async fn save(&self, draft: RecipeDraft, actor: &str) -> ServiceResult<RecipeSaveResult> {
        validate_name("name", &draft.name)?;
        validate_yield(draft.yield_units)?;
        validate_prep_minutes(draft.prep_minutes)?;
        validate_items_not_empty(draft.items.len())?;
        if draft.items.len() > MAX_ITEMS {
            return Err(forno_core::ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_ITEMS as i64,
            }
            .into());
        }

        let recipe_id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.guard_base_references(&recipe_id, &draft.items).await?;

        let (items, ingredient_costs, base_unit_costs, conversion_gaps) =
            self.resolve_items(&recipe_id, &draft.items).await?;

        let settings = self.load_settings().await?;
        let breakdown = rollup(
            &items,
            &ingredient_costs,
            &base_unit_costs,
            draft.prep_minutes,
            draft.yield_units,
            &settings,
        );

        let now = self.clock.now();
        let repo = self.db.recipes();

        let (recipe, old_for_history) = match draft.id {
            None => {
                let recipe = Recipe {
                    id: recipe_id.clone(),
                    tenant_id: DEFAULT_TENANT_ID.to_string(),
                    name: draft.name.trim().to_string(),
                    yield_units: draft.yield_units,
                    prep_minutes: draft.prep_minutes,
                    is_base: draft.is_base,
                    material_cost: breakdown.material_cost,
                    labor_cost: breakdown.labor_cost,
                    overhead_cost: breakdown.overhead_cost,
                    final_cost: breakdown.final_cost,
                    unit_cost: breakdown.unit_cost,
                    selling_price: draft.selling_price,
                    revision: 0,
                    created_at: now,
                    updated_at: now,
                };
                repo.insert(&recipe, &items).await?;
                (recipe, None)
            }
            Some(id) => {
                let existing = repo
                    .get_by_id(&id)
                    .await?
                    .ok_or_else(|| crate::error::DbError::not_found("Recipe", &id))?;

                let recipe = Recipe {
                    id: id.clone(),
                    tenant_id: existing.tenant_id.clone(),
                    name: draft.name.trim().to_string(),
                    yield_units: draft.yield_units,
                    prep_minutes: draft.prep_minutes,
                    is_base: draft.is_base,
                    material_cost: breakdown.material_cost,
                    labor_cost: breakdown.labor_cost,
                    overhead_cost: breakdown.overhead_cost,
                    final_cost: breakdown.final_cost,
                    unit_cost: breakdown.unit_cost,
                    selling_price: draft.selling_price,
                    revision: draft.expected_revision + 1,
                    created_at: existing.created_at,
                    updated_at: now,
                };
                repo.update(&recipe, draft.expected_revision, &items).await?;
                (recipe, Some(existing))
            }
        };

        // Manual selling-price change is itself a history event.
        if let Some(existing) = &old_for_history {
            if existing.selling_price != recipe.selling_price {
                self.db
                    .price_history()
                    .append(&PriceHistory {
                        id: Uuid::new_v4().to_string(),
                        tenant_id: DEFAULT_TENANT_ID.to_string(),
                        recipe_id: recipe.id.clone(),
                        old_unit_cost: existing.unit_cost,
                        new_unit_cost: recipe.unit_cost,
                        old_selling_price: existing.selling_price,
                        new_selling_price: recipe.selling_price,
                        reason: draft
                            .price_reason
                            .clone()
                            .unwrap_or_else(|| "Manual price update".to_string()),
                        changed_by: actor.to_string(),
                        created_at: now,
                    })
                    .await?;
            }
        }

        // A base recipe whose unit cost moved re-prices its dependents.
        let cascade = match &old_for_history {
            Some(existing)
                if recipe.is_base
                    && (recipe.unit_cost - existing.unit_cost).abs() > RECOST_TOLERANCE =>
            {
                debug!(id = %recipe.id, "Base recipe cost moved, cascading");
                CascadePropagator::with_clock(self.db.clone(), self.clock.clone())
                    .propagate(
                        CascadeTrigger::BaseRecipe {
                            id: recipe.id.clone(),
                            name: recipe.name.clone(),
                        },
                        actor,
                    )
                    .await?
            }
            _ => CascadeReport::default(),
        };

        Ok(RecipeSaveResult {
            recipe,
            breakdown,
            conversion_gaps,
            cascade,
        })
    }

    /// Manual selling-price edit with its own audit entry.
    pub async fn update_selling_price(
        &self,
        recipe_id: &str,
        new_price: Option<Money>,
        reason: &str,
        actor: &str,
    ) -> ServiceResult<Recipe> {
        let repo = self.db.recipes();
        let existing = repo
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| crate::error::DbError::not_found("Recipe", recipe_id))?;

        let now = self.clock.now();
        repo.update_selling_price(recipe_id, new_price, now).await?;

        if existing.selling_price != new_price {
            self.db
                .price_history()
                .append(&PriceHistory {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: DEFAULT_TENANT_ID.to_string(),
                    recipe_id: recipe_id.to_string(),
                    old_unit_cost: existing.unit_cost,
                    new_unit_cost: existing.unit_cost,
                    old_selling_price: existing.selling_price,
                    new_selling_price: new_price,
                    reason: reason.to_string(),
                    changed_by: actor.to_string(),
                    created_at: now,
                })
                .await?;
        }

        let recipe = repo
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| crate::error::DbError::not_found("Recipe", recipe_id))?;
        Ok(recipe)
    }

    /// Rejects recipe-kind lines that point at non-base recipes or would
    /// close a cycle in the base graph.
    async fn guard_base_references(
        &self,
        recipe_id: &str,
        items: &[RecipeItemDraft],
    ) -> ServiceResult<()> {
        let recipe_components: Vec<String> = items
            .iter()
            .filter(|item| item.kind == ComponentKind::Recipe)
            .map(|item| item.component_id.clone())
            .collect();

        if recipe_components.is_empty() {
            return Ok(());
        }

        for component_id in &recipe_components {
            let component = self
                .db
                .recipes()
                .get_by_id(component_id)
                .await?
                .ok_or_else(|| crate::error::DbError::not_found("Recipe", component_id))?;
            if !component.is_base {
                return Err(CoreError::NotBaseRecipe {
                    id: component_id.clone(),
                }
                .into());
            }
        }

        // Current edges, minus this recipe's own (they are being replaced)
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in self.db.recipes().base_edges(DEFAULT_TENANT_ID).await? {
            if from != recipe_id {
                edges.entry(from).or_default().push(to);
            }
        }

        if deps::would_cycle(&edges, recipe_id, &recipe_components) {
            return Err(CoreError::CyclicDependency {
                recipe_id: recipe_id.to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Materializes draft lines: resolves entered units to base
    /// quantities and loads the cost lookups for the rollup.
    #[allow(clippy::type_complexity)]
    async fn resolve_items(
        &self,
        recipe_id: &str,
        drafts: &[RecipeItemDraft],
    ) -> ServiceResult<(
        Vec<RecipeItem>,
        HashMap<String, Money>,
        HashMap<String, Money>,
        Vec<LineWarning>,
    )> {
        let now = self.clock.now();
        let mut items = Vec::with_capacity(drafts.len());
        let mut ingredient_costs: HashMap<String, Money> = HashMap::new();
        let mut base_unit_costs: HashMap<String, Money> = HashMap::new();
        let mut gaps = Vec::new();

        for (position, draft) in drafts.iter().enumerate() {
            let base_quantity = match draft.kind {
                ComponentKind::Ingredient => {
                    let ingredients = self.db.ingredients();
                    match ingredients.get_by_id(&draft.component_id).await? {
                        Some(ingredient) => {
                            let conversions =
                                ingredients.conversions_for(&ingredient.id).await?;
                            let (resolved, gap) =
                                resolve_quantity(draft.quantity, &draft.unit, &conversions);
                            if let Some(gap) = gap {
                                gaps.push(LineWarning {
                                    component_id: draft.component_id.clone(),
                                    unit: gap.unit,
                                });
                            }
                            ingredient_costs
                                .insert(ingredient.id.clone(), ingredient.cost_per_base_unit);
                            resolved
                        }
                        // referent gone: keep the raw quantity, the rollup
                        // will flag the orphan
                        None => draft.quantity,
                    }
                }
                ComponentKind::Recipe => {
                    if let Some(base) = self.db.recipes().get_by_id(&draft.component_id).await? {
                        base_unit_costs.insert(base.id.clone(), base.unit_cost);
                    }
                    // recipe components are counted in units of the base
                    // recipe's yield; no unit conversion applies
                    draft.quantity
                }
            };

            items.push(RecipeItem {
                id: Uuid::new_v4().to_string(),
                recipe_id: recipe_id.to_string(),
                kind: draft.kind,
                component_id: draft.component_id.clone(),
                quantity: draft.quantity,
                unit: draft.unit.trim().to_string(),
                base_quantity,
                position: position as i64,
                created_at: now,
            });
        }

        Ok((items, ingredient_costs, base_unit_costs, gaps))
    }

    async fn load_settings(&self) -> ServiceResult<Settings> {
        Ok(match self.db.settings().get(DEFAULT_TENANT_ID).await? {
            Some(settings) => settings,
            None => Settings::default_for(DEFAULT_TENANT_ID, self.clock.now()),
        })
    }
}

// =============================================================================
// Settings Service
// =============================================================================

/// Input rates for a settings save. The labor cost per minute is not
/// here: it is derived from the roster, never entered.
#[derive(Debug, Clone)]
pub struct SettingsDraft {
    pub fixed_overhead_rate: Rate,
    pub monthly_revenue_estimate: Money,
    pub default_tax_rate: Rate,
    pub debit_fee_rate: Rate,
    pub credit_fee_rate: Rate,
}

/// One roster entry on a settings save. `id = None` creates.
#[derive(Debug, Clone)]
pub struct EmployeeDraft {
    pub id: Option<String>,
    pub name: String,
    pub salary: Money,
    pub hours_per_month: i64,
}

/// Service for the settings singleton and the employee roster.
#[derive(Clone)]
pub struct SettingsService {
    db: Database,
    clock: SharedClock,
}

impl SettingsService {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        SettingsService { db, clock }
    }

    /// Current settings, zeroed defaults if none were ever saved.
    pub async fn get_or_default(&self) -> ServiceResult<Settings> {
        Ok(match self.db.settings().get(DEFAULT_TENANT_ID).await? {
            Some(settings) => settings,
            None => Settings::default_for(DEFAULT_TENANT_ID, self.clock.now()),
        })
    }

    /// Saves rates and replaces the employee roster; the stored labor
    /// cost per minute is re-derived from the roster in the same save.
    pub async fn save(
        &self,
        draft: SettingsDraft,
        roster: Vec<EmployeeDraft>,
    ) -> ServiceResult<Settings> {
        validate_rate("fixed_overhead_rate", draft.fixed_overhead_rate)?;
        validate_rate("default_tax_rate", draft.default_tax_rate)?;
        validate_rate("debit_fee_rate", draft.debit_fee_rate)?;
        validate_rate("credit_fee_rate", draft.credit_fee_rate)?;
        for employee in &roster {
            validate_name("employee name", &employee.name)?;
        }

        let now = self.clock.now();
        let repo = self.db.settings();

        // Replace-roster semantics: the draft carries the full list.
        let existing = repo.list_employees(DEFAULT_TENANT_ID).await?;
        let kept: Vec<&str> = roster
            .iter()
            .filter_map(|e| e.id.as_deref())
            .collect();
        for employee in &existing {
            if !kept.contains(&employee.id.as_str()) {
                repo.delete_employee(&employee.id).await?;
            }
        }

        let mut employees = Vec::with_capacity(roster.len());
        for draft_employee in roster {
            let employee = Employee {
                id: draft_employee
                    .id
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                name: draft_employee.name.trim().to_string(),
                salary: draft_employee.salary,
                hours_per_month: draft_employee.hours_per_month,
                created_at: now,
                updated_at: now,
            };
            repo.upsert_employee(&employee).await?;
            employees.push(employee);
        }

        let settings = Settings {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            labor_cost_per_minute: cost_per_minute(&employees),
            fixed_overhead_rate: draft.fixed_overhead_rate,
            monthly_revenue_estimate: draft.monthly_revenue_estimate,
            default_tax_rate: draft.default_tax_rate,
            debit_fee_rate: draft.debit_fee_rate,
            credit_fee_rate: draft.credit_fee_rate,
            updated_at: now,
        };
        repo.save(&settings).await?;

        info!(
            labor_per_minute = %settings.labor_cost_per_minute,
            employees = employees.len(),
            "Settings saved"
        );

        Ok(settings)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::service::ServiceError;
    use crate::test_support::{fixed_clock, flour_draft, seed_settings, test_db};
    use forno_core::units::BaseUnit;

    const OPERATOR: &str = "tester@forno.local";

    fn base_recipe_draft(name: &str, component: RecipeItemDraft) -> RecipeDraft {
        RecipeDraft {
            id: None,
            expected_revision: 0,
            name: name.to_string(),
            yield_units: Quantity::from_units(10),
            prep_minutes: 0,
            is_base: true,
            selling_price: None,
            price_reason: None,
            items: vec![component],
        }
    }

    fn ingredient_line(component_id: &str, units: i64, unit: &str) -> RecipeItemDraft {
        RecipeItemDraft {
            kind: ComponentKind::Ingredient,
            component_id: component_id.to_string(),
            quantity: Quantity::from_units(units),
            unit: unit.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_ingredient_derives_base_cost() {
        let db = test_db().await;
        let service = IngredientService::with_clock(db.clone(), fixed_clock());

        let result = service.save(flour_draft(), OPERATOR).await.unwrap();

        assert_eq!(result.ingredient.cost_per_base_unit, Money::from_scaled(200));
        assert_eq!(result.ingredient.base_unit, BaseUnit::Gram);
        assert!(result.cascade.is_empty());

        // the conversion table was persisted alongside
        let conversions = db
            .ingredients()
            .conversions_for(&result.ingredient.id)
            .await
            .unwrap();
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0].name, "cup");
    }

    #[tokio::test]
    async fn test_stale_revision_update_conflicts() {
        let db = test_db().await;
        let service = IngredientService::with_clock(db.clone(), fixed_clock());
        let saved = service.save(flour_draft(), OPERATOR).await.unwrap().ingredient;

        let mut stale = flour_draft();
        stale.id = Some(saved.id.clone());
        stale.expected_revision = 7; // someone else edited in between
        let err = service.save(stale, OPERATOR).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Db(DbError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_blocked_while_referenced() {
        let db = test_db().await;
        seed_settings(&db).await;
        let ingredients = IngredientService::with_clock(db.clone(), fixed_clock());
        let flour = ingredients.save(flour_draft(), OPERATOR).await.unwrap().ingredient;

        let recipes = RecipeService::with_clock(db.clone(), fixed_clock());
        let recipe = recipes
            .save(
                base_recipe_draft("Massa", ingredient_line(&flour.id, 500, "g")),
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;

        let err = ingredients.delete(&flour.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::IngredientInUse { references: 1, .. })
        ));

        // dropping the recipe releases the ingredient
        db.recipes().delete(&recipe.id).await.unwrap();
        ingredients.delete(&flour.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_recipe_persists_derived_costs() {
        let db = test_db().await;
        seed_settings(&db).await;
        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let result = RecipeService::with_clock(db.clone(), fixed_clock())
            .save(
                RecipeDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Pão caseiro".to_string(),
                    yield_units: Quantity::from_units(4),
                    prep_minutes: 60,
                    is_base: false,
                    selling_price: Some(Money::from_units(10)),
                    price_reason: None,
                    items: vec![ingredient_line(&flour.id, 500, "g")],
                },
                OPERATOR,
            )
            .await
            .unwrap();

        assert_eq!(result.breakdown.material_cost, Money::from_units(10));
        assert_eq!(result.breakdown.labor_cost, Money::from_units(6));
        assert_eq!(result.breakdown.overhead_cost, Money::from_cents(160));
        assert_eq!(result.breakdown.final_cost, Money::from_cents(1_760));
        assert_eq!(result.breakdown.unit_cost, Money::from_cents(440));
        assert!(result.conversion_gaps.is_empty());

        // the stored row carries the same four decimals + unit cost
        let stored = db.recipes().get_by_id(&result.recipe.id).await.unwrap().unwrap();
        assert_eq!(stored.material_cost, Money::from_units(10));
        assert_eq!(stored.final_cost, Money::from_cents(1_760));
        assert_eq!(stored.unit_cost, Money::from_cents(440));
        assert_eq!(
            stored.final_cost,
            stored.material_cost + stored.labor_cost + stored.overhead_cost
        );

        let items = db.recipes().items_for(&stored.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].base_quantity, Quantity::from_units(500));
    }

    #[tokio::test]
    async fn test_named_conversion_resolves_and_gap_is_surfaced() {
        let db = test_db().await;
        seed_settings(&db).await;
        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let result = RecipeService::with_clock(db.clone(), fixed_clock())
            .save(
                RecipeDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Bolo".to_string(),
                    yield_units: Quantity::from_units(1),
                    prep_minutes: 0,
                    is_base: false,
                    selling_price: None,
                    price_reason: None,
                    items: vec![
                        // "cup" has a conversion: 2 cups → 240 g
                        ingredient_line(&flour.id, 2, "cup"),
                        // "colher" has none: raw quantity + warning
                        ingredient_line(&flour.id, 3, "colher"),
                    ],
                },
                OPERATOR,
            )
            .await
            .unwrap();

        let items = db.recipes().items_for(&result.recipe.id).await.unwrap();
        assert_eq!(items[0].base_quantity, Quantity::from_units(240));
        assert_eq!(items[1].base_quantity, Quantity::from_units(3));

        assert_eq!(result.conversion_gaps.len(), 1);
        assert_eq!(result.conversion_gaps[0].unit, "colher");
    }

    #[tokio::test]
    async fn test_recipe_rejects_non_base_component() {
        let db = test_db().await;
        seed_settings(&db).await;
        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let recipes = RecipeService::with_clock(db.clone(), fixed_clock());
        let mut sellable = base_recipe_draft("Bolo", ingredient_line(&flour.id, 100, "g"));
        sellable.is_base = false;
        let sellable = recipes.save(sellable, OPERATOR).await.unwrap().recipe;

        let err = recipes
            .save(
                base_recipe_draft(
                    "Torta",
                    RecipeItemDraft {
                        kind: ComponentKind::Recipe,
                        component_id: sellable.id.clone(),
                        quantity: Quantity::from_units(1),
                        unit: "un".to_string(),
                    },
                ),
                OPERATOR,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::NotBaseRecipe { .. })
        ));
    }

    #[tokio::test]
    async fn test_recipe_rejects_cycle() {
        let db = test_db().await;
        seed_settings(&db).await;
        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let recipes = RecipeService::with_clock(db.clone(), fixed_clock());
        let a = recipes
            .save(
                base_recipe_draft("Base A", ingredient_line(&flour.id, 100, "g")),
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;
        let b = recipes
            .save(
                base_recipe_draft(
                    "Base B",
                    RecipeItemDraft {
                        kind: ComponentKind::Recipe,
                        component_id: a.id.clone(),
                        quantity: Quantity::from_units(1),
                        unit: "un".to_string(),
                    },
                ),
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;

        // closing the loop: A would use B, which already uses A
        let mut cyclic = base_recipe_draft(
            "Base A",
            RecipeItemDraft {
                kind: ComponentKind::Recipe,
                component_id: b.id.clone(),
                quantity: Quantity::from_units(1),
                unit: "un".to_string(),
            },
        );
        cyclic.id = Some(a.id.clone());
        cyclic.expected_revision = a.revision;
        let err = recipes.save(cyclic, OPERATOR).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::CyclicDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_price_edit_appends_history() {
        let db = test_db().await;
        seed_settings(&db).await;
        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let recipes = RecipeService::with_clock(db.clone(), fixed_clock());
        let mut draft = base_recipe_draft("Bolo", ingredient_line(&flour.id, 100, "g"));
        draft.is_base = false;
        let recipe = recipes.save(draft, OPERATOR).await.unwrap().recipe;

        let updated = recipes
            .update_selling_price(
                &recipe.id,
                Some(Money::from_cents(1_250)),
                "Menu reprice",
                OPERATOR,
            )
            .await
            .unwrap();
        assert_eq!(updated.selling_price, Some(Money::from_cents(1_250)));

        let history = db.price_history().list_for_recipe(&recipe.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, "Menu reprice");
        assert_eq!(history[0].old_selling_price, None);
        assert_eq!(history[0].new_selling_price, Some(Money::from_cents(1_250)));
        // a manual price edit does not touch the unit cost
        assert_eq!(history[0].old_unit_cost, history[0].new_unit_cost);
    }

    #[tokio::test]
    async fn test_settings_save_derives_labor_rate() {
        let db = test_db().await;
        seed_settings(&db).await;

        let settings = SettingsService::with_clock(db.clone(), fixed_clock())
            .get_or_default()
            .await
            .unwrap();

        // R$1200 / (200 h × 60) = R$0.10/min
        assert_eq!(settings.labor_cost_per_minute, Money::from_scaled(1_000));
        assert_eq!(settings.fixed_overhead_rate, Rate::from_bps(1_000));
    }

    #[tokio::test]
    async fn test_empty_recipe_rejected() {
        let db = test_db().await;
        seed_settings(&db).await;

        let err = RecipeService::with_clock(db.clone(), fixed_clock())
            .save(
                RecipeDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Vazio".to_string(),
                    yield_units: Quantity::from_units(1),
                    prep_minutes: 0,
                    is_base: false,
                    selling_price: None,
                    price_reason: None,
                    items: vec![],
                },
                OPERATOR,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
    }
}
