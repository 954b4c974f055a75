//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Write Path Is Transaction-Only
//! Orders are created exclusively through the checkout service's
//! transaction: the insert functions here take an open connection instead
//! of the pool, so an order header can never be written without its items
//! committing in the same transaction. Reads go through the pool as usual.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use forno_core::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, tenant_id, session_id, total, discount, change_given, \
     payment_method, fee_amount, net_amount, created_by, created_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_kind, description, \
     quantity, unit_price, line_total, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists the completed orders settled against a session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE session_id = ?1 ORDER BY created_at, id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets the line items of an order, in insertion order.
    pub async fn items_for(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts orders of a session.
    pub async fn count_for_session(&self, session_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE session_id = ?1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transactional Writes
    // =========================================================================

    /// Inserts the order header inside an open transaction.
    pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, tenant_id, session_id, total, discount, change_given,
                payment_method, fee_amount, net_amount, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(&order.tenant_id)
        .bind(&order.session_id)
        .bind(order.total)
        .bind(order.discount)
        .bind(order.change_given)
        .bind(order.payment_method)
        .bind(order.fee_amount)
        .bind(order.net_amount)
        .bind(&order.created_by)
        .bind(order.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one line item inside an open transaction.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_kind, description,
                quantity, unit_price, line_total, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(item.product_kind)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
