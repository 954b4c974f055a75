//! Shared fixtures for the service/repository tests: an in-memory
//! database, a pinned clock, and the calibration catalog the numbered
//! register scenarios run against.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::pool::{Database, DbConfig};
use crate::service::catalog::{
    ConversionDraft, EmployeeDraft, IngredientDraft, SettingsDraft, SettingsService,
};
use crate::service::{Clock, SharedClock};
use forno_core::{IngredientCategory, Money, Quantity, Rate, Unit};

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 2026-03-01 08:00:00 UTC — an arbitrary but stable test instant.
pub fn fixed_clock() -> SharedClock {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
    ))
}

/// Fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Saves the calibration settings: labor R$0.10/min (one employee,
/// R$1200 over 200 h), 10% overhead, 4.5% tax, 2% debit, 4% credit.
pub async fn seed_settings(db: &Database) {
    SettingsService::with_clock(db.clone(), fixed_clock())
        .save(
            SettingsDraft {
                fixed_overhead_rate: Rate::from_bps(1_000),
                monthly_revenue_estimate: Money::from_units(10_000),
                default_tax_rate: Rate::from_bps(450),
                debit_fee_rate: Rate::from_bps(200),
                credit_fee_rate: Rate::from_bps(400),
            },
            vec![EmployeeDraft {
                id: None,
                name: "Ana".to_string(),
                salary: Money::from_units(1_200),
                hours_per_month: 200,
            }],
        )
        .await
        .expect("seed settings");
}

/// Draft for the calibration flour: R$20.00 per 1 kg ⇒ R$0.0200/g.
pub fn flour_draft() -> IngredientDraft {
    IngredientDraft {
        id: None,
        expected_revision: 0,
        name: "Flour".to_string(),
        category: IngredientCategory::Raw,
        package_price: Money::from_units(20),
        package_quantity: Quantity::from_units(1),
        package_unit: Unit::Kilogram,
        current_stock: Quantity::from_units(5_000),
        minimum_stock: Quantity::from_units(1_000),
        conversions: vec![ConversionDraft {
            name: "cup".to_string(),
            base_units_per_unit: Quantity::from_units(120),
        }],
    }
}
