//! # Price History Repository
//!
//! Append-only audit trail. There is deliberately no update or delete
//! here: history rows are immutable once written, whether they came from
//! a cascade recost or a manual price edit.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use forno_core::PriceHistory;

/// Repository for price history records.
#[derive(Debug, Clone)]
pub struct PriceHistoryRepository {
    pool: SqlitePool,
}

impl PriceHistoryRepository {
    /// Creates a new PriceHistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceHistoryRepository { pool }
    }

    /// Appends one history record.
    pub async fn append(&self, entry: &PriceHistory) -> DbResult<()> {
        debug!(recipe_id = %entry.recipe_id, reason = %entry.reason, "Appending price history");

        sqlx::query(
            r#"
            INSERT INTO price_history (
                id, tenant_id, recipe_id,
                old_unit_cost, new_unit_cost,
                old_selling_price, new_selling_price,
                reason, changed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.recipe_id)
        .bind(entry.old_unit_cost)
        .bind(entry.new_unit_cost)
        .bind(entry.old_selling_price)
        .bind(entry.new_selling_price)
        .bind(&entry.reason)
        .bind(&entry.changed_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the history of a recipe, newest first.
    pub async fn list_for_recipe(&self, recipe_id: &str) -> DbResult<Vec<PriceHistory>> {
        let entries = sqlx::query_as::<_, PriceHistory>(
            "SELECT id, tenant_id, recipe_id, old_unit_cost, new_unit_cost, \
             old_selling_price, new_selling_price, reason, changed_by, created_at \
             FROM price_history WHERE recipe_id = ?1 ORDER BY created_at DESC, id",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Counts history rows of a recipe (used by cascade idempotence
    /// checks and reports).
    pub async fn count_for_recipe(&self, recipe_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM price_history WHERE recipe_id = ?1")
                .bind(recipe_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
