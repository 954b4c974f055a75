//! # Checkout Service
//!
//! Records a completed sale. This is the one flow in the system that
//! demands a true all-or-nothing boundary: order header, line items and
//! the resale stock decrements commit in a single SQLite transaction, or
//! none of them persist.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::pool::Database;
use crate::repository::ingredient::IngredientRepository;
use crate::repository::order::OrderRepository;
use crate::service::{Clock, ServiceResult, SharedClock, SystemClock};
use forno_core::settlement::transaction_fee;
use forno_core::validation::validate_quantity;
use forno_core::{
    CoreError, Money, Order, OrderItem, OrderItemKind, PaymentMethod, Quantity, Settings,
    DEFAULT_TENANT_ID,
};

/// One line of a sale being rung up. Description and unit price are
/// frozen into the order at this point.
#[derive(Debug, Clone)]
pub struct SaleLineDraft {
    pub product_id: String,
    pub product_kind: OrderItemKind,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

/// A sale ready to be recorded against an open session.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub session_id: String,
    pub payment_method: PaymentMethod,
    pub discount: Money,
    pub change_given: Money,
    pub items: Vec<SaleLineDraft>,
}

/// Service recording sales atomically.
#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    clock: SharedClock,
}

impl CheckoutService {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        CheckoutService { db, clock }
    }

    /// Processes a sale: totals the lines, computes the card fee, and
    /// persists order + items + stock effects in one transaction.
    ///
    /// Any failure inside the transaction rolls everything back — a sale
    /// is never left half-recorded.
    pub async fn process_sale(&self, draft: SaleDraft, operator: &str) -> ServiceResult<Order> {
        if draft.items.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        for line in &draft.items {
            validate_quantity("quantity", line.quantity)?;
        }

        let session = self
            .db
            .sessions()
            .get_by_id(&draft.session_id)
            .await?
            .ok_or_else(|| crate::error::DbError::not_found("Cash session", &draft.session_id))?;
        if !session.is_open() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: draft.session_id.clone(),
                status: "closed".to_string(),
            }
            .into());
        }

        let settings = self.load_settings().await?;
        let now = self.clock.now();
        let order_id = Uuid::new_v4().to_string();

        let mut subtotal = Money::zero();
        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let line_total = line.unit_price.mul_quantity(line.quantity);
            subtotal += line_total;
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                product_kind: line.product_kind,
                description: line.description.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total,
                created_at: now,
            });
        }

        let total = subtotal - draft.discount;
        let fee = transaction_fee(total, draft.payment_method, &settings);

        let order = Order {
            id: order_id.clone(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            session_id: draft.session_id.clone(),
            total,
            discount: draft.discount,
            change_given: draft.change_given,
            payment_method: draft.payment_method,
            fee_amount: fee.fee,
            net_amount: fee.net,
            created_by: operator.to_string(),
            created_at: now,
        };

        // The atomic boundary: an early return anywhere below drops the
        // transaction, and SQLite rolls the whole sale back.
        let mut tx = self.db.pool().begin().await.map_err(crate::error::DbError::from)?;

        OrderRepository::insert_order(&mut tx, &order).await?;
        for item in &items {
            OrderRepository::insert_item(&mut tx, item).await?;
        }
        for item in &items {
            if item.product_kind == OrderItemKind::Resale {
                IngredientRepository::adjust_stock_in(
                    &mut tx,
                    &item.product_id,
                    Quantity::zero() - item.quantity,
                )
                .await?;
            }
        }

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            order_id = %order.id,
            session_id = %order.session_id,
            total = %order.total,
            method = ?order.payment_method,
            items = items.len(),
            "Sale recorded"
        );

        Ok(order)
    }

    async fn load_settings(&self) -> ServiceResult<Settings> {
        Ok(match self.db.settings().get(DEFAULT_TENANT_ID).await? {
            Some(settings) => settings,
            None => Settings::default_for(DEFAULT_TENANT_ID, self.clock.now()),
        })
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::service::catalog::{IngredientDraft, IngredientService};
    use crate::service::register::CashSessionService;
    use crate::service::ServiceError;
    use crate::test_support::{fixed_clock, seed_settings, test_db};
    use forno_core::{IngredientCategory, Unit};

    const OPERATOR: &str = "op-1";

    async fn open_session(db: &Database) -> String {
        CashSessionService::with_clock(db.clone(), fixed_clock())
            .open_session(OPERATOR, "op@forno.local", Money::from_units(100))
            .await
            .unwrap()
            .id
    }

    fn recipe_line(cents: i64, units: i64) -> SaleLineDraft {
        SaleLineDraft {
            product_id: "prod-1".to_string(),
            product_kind: OrderItemKind::Recipe,
            description: "Carolina".to_string(),
            quantity: Quantity::from_units(units),
            unit_price: Money::from_cents(cents),
        }
    }

    #[tokio::test]
    async fn test_sale_totals_discount_and_fee() {
        let db = test_db().await;
        seed_settings(&db).await;
        let session_id = open_session(&db).await;

        let order = CheckoutService::with_clock(db.clone(), fixed_clock())
            .process_sale(
                SaleDraft {
                    session_id: session_id.clone(),
                    payment_method: PaymentMethod::Debit, // 2% in the seed settings
                    discount: Money::from_cents(500),
                    change_given: Money::zero(),
                    items: vec![recipe_line(2_500, 2)],
                },
                OPERATOR,
            )
            .await
            .unwrap();

        // 2 × 25.00 − 5.00 = 45.00; 2% fee = 0.90
        assert_eq!(order.total, Money::from_units(45));
        assert_eq!(order.fee_amount, Money::from_cents(90));
        assert_eq!(order.net_amount, Money::from_cents(4_410));
        assert_eq!(order.fee_amount + order.net_amount, order.total);

        let items = db.orders().items_for(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total, Money::from_units(50));
    }

    #[tokio::test]
    async fn test_resale_sale_decrements_stock() {
        let db = test_db().await;
        seed_settings(&db).await;
        let session_id = open_session(&db).await;

        let water = IngredientService::with_clock(db.clone(), fixed_clock())
            .save(
                IngredientDraft {
                    id: None,
                    expected_revision: 0,
                    name: "Mineral water".to_string(),
                    category: IngredientCategory::Resale,
                    package_price: Money::from_units(30),
                    package_quantity: Quantity::from_units(12),
                    package_unit: Unit::Piece,
                    current_stock: Quantity::from_units(24),
                    minimum_stock: Quantity::from_units(6),
                    conversions: vec![],
                },
                OPERATOR,
            )
            .await
            .unwrap()
            .ingredient;

        CheckoutService::with_clock(db.clone(), fixed_clock())
            .process_sale(
                SaleDraft {
                    session_id,
                    payment_method: PaymentMethod::Pix,
                    discount: Money::zero(),
                    change_given: Money::zero(),
                    items: vec![SaleLineDraft {
                        product_id: water.id.clone(),
                        product_kind: OrderItemKind::Resale,
                        description: water.name.clone(),
                        quantity: Quantity::from_units(2),
                        unit_price: Money::from_cents(400),
                    }],
                },
                OPERATOR,
            )
            .await
            .unwrap();

        let after = db.ingredients().get_by_id(&water.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, Quantity::from_units(22));
    }

    /// A failing stock decrement must take the already-inserted order and
    /// items down with it: the sale is all-or-nothing.
    #[tokio::test]
    async fn test_failed_sale_rolls_back_completely() {
        let db = test_db().await;
        seed_settings(&db).await;
        let session_id = open_session(&db).await;

        let err = CheckoutService::with_clock(db.clone(), fixed_clock())
            .process_sale(
                SaleDraft {
                    session_id: session_id.clone(),
                    payment_method: PaymentMethod::Cash,
                    discount: Money::zero(),
                    change_given: Money::zero(),
                    items: vec![SaleLineDraft {
                        product_id: "no-such-ingredient".to_string(),
                        product_kind: OrderItemKind::Resale,
                        description: "Ghost".to_string(),
                        quantity: Quantity::from_units(1),
                        unit_price: Money::from_cents(400),
                    }],
                },
                OPERATOR,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Db(DbError::NotFound { .. })));
        // nothing persisted: no half-recorded sale
        assert_eq!(db.orders().count_for_session(&session_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sale_requires_open_session_and_items() {
        let db = test_db().await;
        seed_settings(&db).await;
        let session_id = open_session(&db).await;
        let checkout = CheckoutService::with_clock(db.clone(), fixed_clock());

        let err = checkout
            .process_sale(
                SaleDraft {
                    session_id: session_id.clone(),
                    payment_method: PaymentMethod::Cash,
                    discount: Money::zero(),
                    change_given: Money::zero(),
                    items: vec![],
                },
                OPERATOR,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptySale)));

        CashSessionService::with_clock(db.clone(), fixed_clock())
            .close_session(&session_id, Money::from_units(100), None)
            .await
            .unwrap();

        let err = checkout
            .process_sale(
                SaleDraft {
                    session_id,
                    payment_method: PaymentMethod::Cash,
                    discount: Money::zero(),
                    change_given: Money::zero(),
                    items: vec![recipe_line(400, 1)],
                },
                OPERATOR,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidSessionStatus { .. })
        ));
    }
}
