//! # Ingredient Repository
//!
//! Database operations for ingredients and their named unit conversions.
//!
//! ## Key Operations
//! - CRUD with optimistic revision checks
//! - Conversion table replacement (conversions are owned by the ingredient)
//! - Recipe reference counting (deletion guard)
//! - Stock adjustment inside the checkout transaction

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use forno_core::{Ingredient, Quantity, UnitConversion};

const INGREDIENT_COLUMNS: &str = "id, tenant_id, name, category, package_price, \
     package_quantity, package_unit, base_unit, cost_per_base_unit, \
     current_stock, minimum_stock, revision, created_at, updated_at";

/// Repository for ingredient database operations.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    /// Creates a new IngredientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    /// Gets an ingredient by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Lists all ingredients of a tenant, ordered by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE tenant_id = ?1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Lists ingredients whose stock is at or below the reorder threshold.
    pub async fn list_low_stock(&self, tenant_id: &str) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients \
             WHERE tenant_id = ?1 AND current_stock <= minimum_stock ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Inserts a new ingredient.
    pub async fn insert(&self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, tenant_id, name, category,
                package_price, package_quantity, package_unit, base_unit,
                cost_per_base_unit, current_stock, minimum_stock,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.tenant_id)
        .bind(&ingredient.name)
        .bind(ingredient.category)
        .bind(ingredient.package_price)
        .bind(ingredient.package_quantity)
        .bind(ingredient.package_unit)
        .bind(ingredient.base_unit)
        .bind(ingredient.cost_per_base_unit)
        .bind(ingredient.current_stock)
        .bind(ingredient.minimum_stock)
        .bind(ingredient.revision)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an ingredient, guarded by its optimistic revision.
    ///
    /// The row is written only if `expected_revision` still matches;
    /// a concurrent edit since the caller's read fails with
    /// [`DbError::Conflict`] instead of silently clobbering it.
    pub async fn update(&self, ingredient: &Ingredient, expected_revision: i64) -> DbResult<()> {
        debug!(id = %ingredient.id, expected_revision, "Updating ingredient");

        let result = sqlx::query(
            r#"
            UPDATE ingredients SET
                name = ?2,
                category = ?3,
                package_price = ?4,
                package_quantity = ?5,
                package_unit = ?6,
                base_unit = ?7,
                cost_per_base_unit = ?8,
                current_stock = ?9,
                minimum_stock = ?10,
                revision = revision + 1,
                updated_at = ?11
            WHERE id = ?1 AND revision = ?12
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.category)
        .bind(ingredient.package_price)
        .bind(ingredient.package_quantity)
        .bind(ingredient.package_unit)
        .bind(ingredient.base_unit)
        .bind(ingredient.cost_per_base_unit)
        .bind(ingredient.current_stock)
        .bind(ingredient.minimum_stock)
        .bind(ingredient.updated_at)
        .bind(expected_revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a stale revision from a missing row
            return match self.get_by_id(&ingredient.id).await? {
                Some(_) => Err(DbError::conflict(
                    "Ingredient",
                    &ingredient.id,
                    expected_revision,
                )),
                None => Err(DbError::not_found("Ingredient", &ingredient.id)),
            };
        }

        Ok(())
    }

    /// Deletes an ingredient row. The service layer checks references
    /// first; this is the raw delete.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Counts recipe items referencing this ingredient.
    pub async fn reference_count(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM recipe_items WHERE component_id = ?1 AND kind = 'ingredient'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // =========================================================================
    // Unit Conversions
    // =========================================================================

    /// Lists the named conversions of an ingredient.
    pub async fn conversions_for(&self, ingredient_id: &str) -> DbResult<Vec<UnitConversion>> {
        let conversions = sqlx::query_as::<_, UnitConversion>(
            "SELECT id, ingredient_id, name, base_units_per_unit \
             FROM ingredient_conversions WHERE ingredient_id = ?1 ORDER BY name",
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversions)
    }

    /// Replaces the full conversion table of an ingredient.
    /// Conversions are owned by their ingredient, so a save always sends
    /// the complete list.
    pub async fn replace_conversions(
        &self,
        ingredient_id: &str,
        conversions: &[UnitConversion],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ingredient_conversions WHERE ingredient_id = ?1")
            .bind(ingredient_id)
            .execute(&mut *tx)
            .await?;

        for conversion in conversions {
            sqlx::query(
                "INSERT INTO ingredient_conversions (id, ingredient_id, name, base_units_per_unit) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&conversion.id)
            .bind(ingredient_id)
            .bind(&conversion.name)
            .bind(conversion.base_units_per_unit)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Adjusts stock by a (possibly negative) delta inside an existing
    /// transaction. Used by checkout so the decrement commits or rolls
    /// back together with the order.
    pub async fn adjust_stock_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta: Quantity,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE ingredients SET current_stock = current_stock + ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }
}
