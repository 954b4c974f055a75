//! # Cascade Propagator
//!
//! Re-derives costs for every recipe depending on a changed ingredient or
//! base recipe, and records the auditable price-history trail.
//!
//! ## Propagation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Flour price changes                                                   │
//! │       │                                                                 │
//! │       ▼  one-hop dependent lookup (recipe_items.component_id)          │
//! │  [Dough*] [Cake]                * = base recipe                         │
//! │       │                                                                 │
//! │       ▼  Dough's unit cost moved beyond tolerance → its own trigger    │
//! │  [Croissant] [Pastel]                                                  │
//! │                                                                         │
//! │  Per recipe:  unaffected → evaluating → unchanged | recost-applied     │
//! │                                                                         │
//! │  • visited-set + depth bound: cyclic legacy data cannot loop us        │
//! │  • tolerance R$0.01: rounding residue makes no history noise           │
//! │  • one recipe failing never aborts its siblings                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::pool::Database;
use crate::service::{Clock, ServiceResult, SharedClock, SystemClock};
use forno_core::rollup::rollup;
use forno_core::{
    ComponentKind, Money, PriceHistory, Recipe, Settings, DEFAULT_TENANT_ID, MAX_CASCADE_DEPTH,
    RECOST_TOLERANCE,
};

// =============================================================================
// Trigger & Report Types
// =============================================================================

/// What changed and started the cascade.
#[derive(Debug, Clone)]
pub enum CascadeTrigger {
    Ingredient { id: String, name: String },
    BaseRecipe { id: String, name: String },
}

impl CascadeTrigger {
    fn component(&self) -> (ComponentKind, &str) {
        match self {
            CascadeTrigger::Ingredient { id, .. } => (ComponentKind::Ingredient, id),
            CascadeTrigger::BaseRecipe { id, .. } => (ComponentKind::Recipe, id),
        }
    }

    /// Human-readable reason stored on generated history rows.
    fn reason(&self) -> String {
        match self {
            CascadeTrigger::Ingredient { name, .. } => {
                format!("Cost update triggered by ingredient '{name}'")
            }
            CascadeTrigger::BaseRecipe { name, .. } => {
                format!("Cost update triggered by base recipe '{name}'")
            }
        }
    }
}

/// One recipe whose costs were rewritten.
#[derive(Debug, Clone)]
pub struct RecostOutcome {
    pub recipe_id: String,
    pub recipe_name: String,
    pub old_unit_cost: Money,
    pub new_unit_cost: Money,
}

/// One recipe that could not be recosted. Collected, never thrown: a
/// broken recipe must not block its siblings.
#[derive(Debug, Clone)]
pub struct CascadeFailure {
    pub recipe_id: String,
    pub error: String,
}

/// Partial-success result of one propagation run.
#[derive(Debug, Clone, Default)]
pub struct CascadeReport {
    pub applied: Vec<RecostOutcome>,
    pub unchanged: Vec<String>,
    pub failures: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.unchanged.is_empty() && self.failures.is_empty()
    }
}

// =============================================================================
// Propagator
// =============================================================================

/// Service that walks the dependent-recipe graph after a cost change.
#[derive(Clone)]
pub struct CascadePropagator {
    db: Database,
    clock: SharedClock,
}

impl CascadePropagator {
    /// Creates a propagator reading real time.
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a propagator with an injected clock (tests).
    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        CascadePropagator { db, clock }
    }

    /// Runs the cascade for one changed entity.
    ///
    /// Dependent recipes are found one hop at a time; a recosted base
    /// recipe enqueues its own trigger, which is how deep chains
    /// propagate. Each recipe is evaluated at most once per run, so
    /// re-running with no intervening change appends no history
    /// (idempotence), and cyclic legacy data terminates.
    pub async fn propagate(
        &self,
        trigger: CascadeTrigger,
        actor: &str,
    ) -> ServiceResult<CascadeReport> {
        let settings = self.load_settings().await?;

        let mut report = CascadeReport::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(CascadeTrigger, usize)> = VecDeque::new();
        queue.push_back((trigger, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= MAX_CASCADE_DEPTH {
                warn!(depth, "Cascade depth bound hit; catalog likely cyclic");
                break;
            }

            let (kind, component_id) = current.component();
            let dependents = self.db.recipes().dependents_on(component_id, kind).await?;

            debug!(
                component = component_id,
                dependents = dependents.len(),
                depth,
                "Evaluating cascade hop"
            );

            for recipe_id in dependents {
                if !visited.insert(recipe_id.clone()) {
                    continue;
                }

                match self.recost_one(&recipe_id, &current, actor, &settings).await {
                    Ok(RecostResult::Applied { recipe, outcome }) => {
                        if recipe.is_base {
                            queue.push_back((
                                CascadeTrigger::BaseRecipe {
                                    id: recipe.id.clone(),
                                    name: recipe.name.clone(),
                                },
                                depth + 1,
                            ));
                        }
                        report.applied.push(outcome);
                    }
                    Ok(RecostResult::Unchanged) => report.unchanged.push(recipe_id),
                    Err(err) => {
                        // isolate: siblings still get their recost
                        warn!(recipe_id = %recipe_id, error = %err, "Recost failed");
                        report.failures.push(CascadeFailure {
                            recipe_id,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            applied = report.applied.len(),
            unchanged = report.unchanged.len(),
            failures = report.failures.len(),
            "Cascade complete"
        );

        Ok(report)
    }

    /// Re-runs the rollup for one recipe and persists the result when the
    /// unit cost moved beyond tolerance.
    async fn recost_one(
        &self,
        recipe_id: &str,
        trigger: &CascadeTrigger,
        actor: &str,
        settings: &Settings,
    ) -> ServiceResult<RecostResult> {
        let recipes = self.db.recipes();

        let recipe = recipes
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| crate::error::DbError::not_found("Recipe", recipe_id))?;

        let items = recipes.items_for(recipe_id).await?;

        // Resolve component costs. Items whose referent vanished stay out
        // of the maps; the rollup flags them as orphans and counts zero.
        let mut ingredient_costs: HashMap<String, Money> = HashMap::new();
        let mut base_unit_costs: HashMap<String, Money> = HashMap::new();

        for item in &items {
            match item.kind {
                ComponentKind::Ingredient => {
                    if let Some(ingredient) =
                        self.db.ingredients().get_by_id(&item.component_id).await?
                    {
                        ingredient_costs.insert(ingredient.id.clone(), ingredient.cost_per_base_unit);
                    }
                }
                ComponentKind::Recipe => {
                    if let Some(base) = recipes.get_by_id(&item.component_id).await? {
                        base_unit_costs.insert(base.id.clone(), base.unit_cost);
                    }
                }
            }
        }

        let breakdown = rollup(
            &items,
            &ingredient_costs,
            &base_unit_costs,
            recipe.prep_minutes,
            recipe.yield_units,
            settings,
        );

        let delta = (breakdown.unit_cost - recipe.unit_cost).abs();
        if delta <= RECOST_TOLERANCE {
            return Ok(RecostResult::Unchanged);
        }

        let now = self.clock.now();
        recipes.update_costs(recipe_id, &breakdown, now).await?;

        // The cost moved; the selling price is the operator's call and
        // stays untouched — both old and new price record the same value.
        self.db
            .price_history()
            .append(&PriceHistory {
                id: Uuid::new_v4().to_string(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                recipe_id: recipe_id.to_string(),
                old_unit_cost: recipe.unit_cost,
                new_unit_cost: breakdown.unit_cost,
                old_selling_price: recipe.selling_price,
                new_selling_price: recipe.selling_price,
                reason: trigger.reason(),
                changed_by: actor.to_string(),
                created_at: now,
            })
            .await?;

        let outcome = RecostOutcome {
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            old_unit_cost: recipe.unit_cost,
            new_unit_cost: breakdown.unit_cost,
        };

        Ok(RecostResult::Applied { recipe, outcome })
    }

    async fn load_settings(&self) -> ServiceResult<Settings> {
        Ok(match self.db.settings().get(DEFAULT_TENANT_ID).await? {
            Some(settings) => settings,
            None => Settings::default_for(DEFAULT_TENANT_ID, self.clock.now()),
        })
    }
}

enum RecostResult {
    Applied { recipe: Recipe, outcome: RecostOutcome },
    Unchanged,
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::catalog::{
        IngredientService, RecipeDraft, RecipeItemDraft, RecipeService,
    };
    use crate::test_support::{fixed_clock, flour_draft, seed_settings, test_db};
    use forno_core::Quantity;

    const OPERATOR: &str = "tester@forno.local";

    /// Flour at R$0.02/g, 500 g + 60 min at R$0.10/min, 10% overhead,
    /// yield 4 ⇒ unit cost R$4.40. Selling price set to R$10.00.
    async fn seed_flour_recipe(db: &Database) -> (String, String) {
        seed_settings(db).await;

        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let recipe = RecipeService::with_clock(db.clone(), fixed_clock())
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
                    items: vec![RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: flour.id.clone(),
                        quantity: Quantity::from_units(500),
                        unit: "g".to_string(),
                    }],
                },
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;

        assert_eq!(recipe.unit_cost, Money::from_cents(440));
        (flour.id, recipe.id)
    }

    #[tokio::test]
    async fn test_price_change_recosts_and_appends_one_history_row() {
        let db = test_db().await;
        let (flour_id, recipe_id) = seed_flour_recipe(&db).await;

        // Flour R$20 → R$30 per kg: R$0.02/g → R$0.03/g
        let mut draft = flour_draft();
        draft.id = Some(flour_id);
        draft.expected_revision = 0;
        draft.package_price = Money::from_units(30);
        let result = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(draft, OPERATOR)
            .await
            .unwrap();

        assert_eq!(result.cascade.applied.len(), 1);
        let outcome = &result.cascade.applied[0];
        assert_eq!(outcome.old_unit_cost, Money::from_cents(440));
        // material 15.00 + labor 6.00 = 21.00, +10% = 23.10, /4 = 5.775
        assert_eq!(outcome.new_unit_cost, Money::from_scaled(57_750));

        let recipe = db.recipes().get_by_id(&recipe_id).await.unwrap().unwrap();
        assert_eq!(recipe.unit_cost, Money::from_scaled(57_750));
        // the cost moved; the price did not
        assert_eq!(recipe.selling_price, Some(Money::from_units(10)));

        let history = db.price_history().list_for_recipe(&recipe_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_unit_cost, Money::from_cents(440));
        assert_eq!(history[0].new_unit_cost, Money::from_scaled(57_750));
        assert_eq!(history[0].old_selling_price, Some(Money::from_units(10)));
        assert_eq!(history[0].new_selling_price, Some(Money::from_units(10)));
        assert!(history[0].reason.contains("Flour"));
        assert_eq!(history[0].changed_by, OPERATOR);
    }

    #[tokio::test]
    async fn test_cascade_is_idempotent() {
        let db = test_db().await;
        let (flour_id, recipe_id) = seed_flour_recipe(&db).await;

        let flour = db.ingredients().get_by_id(&flour_id).await.unwrap().unwrap();
        let propagator = CascadePropagator::with_clock(db.clone(), fixed_clock());
        let trigger = || CascadeTrigger::Ingredient {
            id: flour.id.clone(),
            name: flour.name.clone(),
        };

        // costs already match what the rollup derives: nothing to apply
        let first = propagator.propagate(trigger(), OPERATOR).await.unwrap();
        assert!(first.applied.is_empty());
        assert_eq!(first.unchanged, vec![recipe_id.clone()]);

        let second = propagator.propagate(trigger(), OPERATOR).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(
            db.price_history().count_for_recipe(&recipe_id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_cascade_propagates_through_base_recipes() {
        let db = test_db().await;
        seed_settings(&db).await;

        let flour = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(flour_draft(), OPERATOR)
            .await
            .unwrap()
            .ingredient;

        let recipes = RecipeService::with_clock(db.clone(), fixed_clock());

        // base: 1000 g flour, no labor, yield 10 → unit cost 2.20 (incl. 10% overhead)
        let dough = recipes
            .save(
                RecipeDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Massa base".to_string(),
                    yield_units: Quantity::from_units(10),
                    prep_minutes: 0,
                    is_base: true,
                    selling_price: None,
                    price_reason: None,
                    items: vec![RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: flour.id.clone(),
                        quantity: Quantity::from_units(1),
                        unit: "kg".to_string(),
                    }],
                },
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;

        // sellable: 2 units of the base, yield 1
        let pastel = recipes
            .save(
                RecipeDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Pastel".to_string(),
                    yield_units: Quantity::from_units(1),
                    prep_minutes: 0,
                    is_base: false,
                    selling_price: None,
                    price_reason: None,
                    items: vec![RecipeItemDraft {
                        kind: ComponentKind::Recipe,
                        component_id: dough.id.clone(),
                        quantity: Quantity::from_units(2),
                        unit: "un".to_string(),
                    }],
                },
                OPERATOR,
            )
            .await
            .unwrap()
            .recipe;

        // doubling the flour price must reach the sellable through the base
        let mut draft = flour_draft();
        draft.id = Some(flour.id.clone());
        draft.expected_revision = 0;
        draft.package_price = Money::from_units(40);
        let result = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(draft, OPERATOR)
            .await
            .unwrap();

        let recosted: Vec<&str> = result
            .cascade
            .applied
            .iter()
            .map(|o| o.recipe_id.as_str())
            .collect();
        assert!(recosted.contains(&dough.id.as_str()));
        assert!(recosted.contains(&pastel.id.as_str()));

        // both got their own audit rows
        assert_eq!(db.price_history().count_for_recipe(&dough.id).await.unwrap(), 1);
        assert_eq!(db.price_history().count_for_recipe(&pastel.id).await.unwrap(), 1);
    }
}
