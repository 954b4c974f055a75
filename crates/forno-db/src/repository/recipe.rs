//! # Recipe Repository
//!
//! Database operations for recipes and their bill-of-materials lines.
//!
//! ## Ownership
//! Recipe items are owned by their parent recipe: a save replaces the
//! whole item list in one transaction, and deleting a recipe cascades to
//! its items. Cost columns are only ever written from a rollup result —
//! there is no setter for an individual cost field.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use forno_core::rollup::CostBreakdown;
use forno_core::{ComponentKind, Money, Recipe, RecipeItem};

const RECIPE_COLUMNS: &str = "id, tenant_id, name, yield_units, prep_minutes, is_base, \
     material_cost, labor_cost, overhead_cost, final_cost, unit_cost, \
     selling_price, revision, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, recipe_id, kind, component_id, quantity, unit, base_quantity, position, created_at";

/// Repository for recipe database operations.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Gets a recipe by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// Lists all recipes of a tenant, ordered by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE tenant_id = ?1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    /// Lists base (intermediate) recipes of a tenant.
    pub async fn list_bases(&self, tenant_id: &str) -> DbResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE tenant_id = ?1 AND is_base = 1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    /// Gets the item list of a recipe, in display order.
    pub async fn items_for(&self, recipe_id: &str) -> DbResult<Vec<RecipeItem>> {
        let items = sqlx::query_as::<_, RecipeItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM recipe_items WHERE recipe_id = ?1 ORDER BY position"
        ))
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new recipe together with its items, atomically.
    pub async fn insert(&self, recipe: &Recipe, items: &[RecipeItem]) -> DbResult<()> {
        debug!(id = %recipe.id, name = %recipe.name, items = items.len(), "Inserting recipe");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, tenant_id, name, yield_units, prep_minutes, is_base,
                material_cost, labor_cost, overhead_cost, final_cost, unit_cost,
                selling_price, revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.tenant_id)
        .bind(&recipe.name)
        .bind(recipe.yield_units)
        .bind(recipe.prep_minutes)
        .bind(recipe.is_base)
        .bind(recipe.material_cost)
        .bind(recipe.labor_cost)
        .bind(recipe.overhead_cost)
        .bind(recipe.final_cost)
        .bind(recipe.unit_cost)
        .bind(recipe.selling_price)
        .bind(recipe.revision)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Updates a recipe and replaces its item list, atomically, guarded
    /// by the optimistic revision.
    pub async fn update(
        &self,
        recipe: &Recipe,
        expected_revision: i64,
        items: &[RecipeItem],
    ) -> DbResult<()> {
        debug!(id = %recipe.id, expected_revision, items = items.len(), "Updating recipe");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes SET
                name = ?2,
                yield_units = ?3,
                prep_minutes = ?4,
                is_base = ?5,
                material_cost = ?6,
                labor_cost = ?7,
                overhead_cost = ?8,
                final_cost = ?9,
                unit_cost = ?10,
                selling_price = ?11,
                revision = revision + 1,
                updated_at = ?12
            WHERE id = ?1 AND revision = ?13
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.name)
        .bind(recipe.yield_units)
        .bind(recipe.prep_minutes)
        .bind(recipe.is_base)
        .bind(recipe.material_cost)
        .bind(recipe.labor_cost)
        .bind(recipe.overhead_cost)
        .bind(recipe.final_cost)
        .bind(recipe.unit_cost)
        .bind(recipe.selling_price)
        .bind(recipe.updated_at)
        .bind(expected_revision)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.get_by_id(&recipe.id).await? {
                Some(_) => Err(DbError::conflict("Recipe", &recipe.id, expected_revision)),
                None => Err(DbError::not_found("Recipe", &recipe.id)),
            };
        }

        sqlx::query("DELETE FROM recipe_items WHERE recipe_id = ?1")
            .bind(&recipe.id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Writes a rollup result onto a recipe.
    ///
    /// Used by the cascade propagator; bumps the revision so an operator
    /// edit based on pre-recost data fails its optimistic check.
    pub async fn update_costs(
        &self,
        recipe_id: &str,
        costs: &CostBreakdown,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE recipes SET
                material_cost = ?2,
                labor_cost = ?3,
                overhead_cost = ?4,
                final_cost = ?5,
                unit_cost = ?6,
                revision = revision + 1,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(recipe_id)
        .bind(costs.material_cost)
        .bind(costs.labor_cost)
        .bind(costs.overhead_cost)
        .bind(costs.final_cost)
        .bind(costs.unit_cost)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", recipe_id));
        }

        Ok(())
    }

    /// Sets the operator-facing selling price.
    pub async fn update_selling_price(
        &self,
        recipe_id: &str,
        selling_price: Option<Money>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE recipes SET selling_price = ?2, revision = revision + 1, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(recipe_id)
        .bind(selling_price)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", recipe_id));
        }

        Ok(())
    }

    /// Deletes a recipe (items cascade).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", id));
        }

        Ok(())
    }

    // =========================================================================
    // Dependency Queries
    // =========================================================================

    /// Recipe ids whose item list directly references the given
    /// component. One hop only: transitive chains re-enter through the
    /// cascade itself.
    pub async fn dependents_on(
        &self,
        component_id: &str,
        kind: ComponentKind,
    ) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT recipe_id FROM recipe_items \
             WHERE component_id = ?1 AND kind = ?2 ORDER BY recipe_id",
        )
        .bind(component_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// All recipe → base-recipe edges of a tenant, for cycle checks.
    pub async fn base_edges(&self, tenant_id: &str) -> DbResult<Vec<(String, String)>> {
        let edges: Vec<(String, String)> = sqlx::query_as(
            "SELECT ri.recipe_id, ri.component_id \
             FROM recipe_items ri \
             JOIN recipes r ON r.id = ri.recipe_id \
             WHERE ri.kind = 'recipe' AND r.tenant_id = ?1",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }
}

/// Inserts a single recipe item inside an open transaction.
async fn insert_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    item: &RecipeItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO recipe_items (
            id, recipe_id, kind, component_id,
            quantity, unit, base_quantity, position, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.recipe_id)
    .bind(item.kind)
    .bind(&item.component_id)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(item.base_quantity)
    .bind(item.position)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
