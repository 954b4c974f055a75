//! # Seed Data Generator
//!
//! Populates the database with a small demo catalog for development:
//! settings with a one-person roster, a pantry of ingredients, a base
//! recipe (pastry cream) and two sellable recipes priced off it.
//!
//! ## Usage
//! ```bash
//! cargo run -p forno-db --bin seed
//! cargo run -p forno-db --bin seed -- --db ./data/forno.db
//! ```

use std::env;

use forno_core::money::{Money, Quantity, Rate};
use forno_core::{ComponentKind, IngredientCategory, Unit};
use forno_db::service::catalog::{
    ConversionDraft, EmployeeDraft, IngredientDraft, IngredientService, RecipeDraft,
    RecipeItemDraft, RecipeService, SettingsDraft, SettingsService,
};
use forno_db::{Database, DbConfig};

const SEED_OPERATOR: &str = "seed@forno.local";

/// Demo pantry: (name, category, package price in cents, package qty, unit).
const PANTRY: &[(&str, IngredientCategory, i64, i64, Unit)] = &[
    ("Wheat flour", IngredientCategory::Raw, 2_000, 1, Unit::Kilogram),
    ("Refined sugar", IngredientCategory::Raw, 550, 1, Unit::Kilogram),
    ("Whole milk", IngredientCategory::Raw, 650, 1, Unit::Liter),
    ("Butter", IngredientCategory::Raw, 1_450, 500, Unit::Gram),
    ("Eggs", IngredientCategory::Raw, 1_800, 30, Unit::Piece),
    ("Cornstarch", IngredientCategory::Raw, 890, 500, Unit::Gram),
    ("Cake box", IngredientCategory::Packaging, 4_500, 50, Unit::Piece),
    ("Mineral water 500ml", IngredientCategory::Resale, 3_000, 12, Unit::Piece),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut db_path = String::from("./forno_dev.db");

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Forno Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./forno_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Forno Seed Data Generator");
    println!("=========================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    // ------------------------------------------------------------------
    // Settings + roster
    // ------------------------------------------------------------------
    let settings = SettingsService::new(db.clone())
        .save(
            SettingsDraft {
                fixed_overhead_rate: Rate::from_bps(1_000), // 10%
                monthly_revenue_estimate: Money::from_units(12_000),
                default_tax_rate: Rate::from_bps(450),  // 4.5%
                debit_fee_rate: Rate::from_bps(200),    // 2%
                credit_fee_rate: Rate::from_bps(399),   // 3.99%
            },
            vec![EmployeeDraft {
                id: None,
                name: "Ana Confeiteira".to_string(),
                salary: Money::from_units(1_200),
                hours_per_month: 200,
            }],
        )
        .await?;
    println!(
        "✓ Settings saved (labor {}/min)",
        settings.labor_cost_per_minute
    );

    // ------------------------------------------------------------------
    // Pantry
    // ------------------------------------------------------------------
    let ingredients = IngredientService::new(db.clone());
    let mut ids = Vec::new();

    for (name, category, price_cents, qty, unit) in PANTRY {
        let result = ingredients
            .save(
                IngredientDraft {
                    id: None,
                    expected_revision: 0,
                    name: (*name).to_string(),
                    category: *category,
                    package_price: Money::from_cents(*price_cents),
                    package_quantity: Quantity::from_units(*qty),
                    package_unit: *unit,
                    current_stock: Quantity::from_units(qty * 10),
                    minimum_stock: Quantity::from_units(*qty),
                    conversions: match *name {
                        "Wheat flour" => vec![ConversionDraft {
                            name: "cup".to_string(),
                            base_units_per_unit: Quantity::from_units(120),
                        }],
                        _ => vec![],
                    },
                },
                SEED_OPERATOR,
            )
            .await?;
        println!(
            "  + {} ({}/{})",
            result.ingredient.name,
            result.ingredient.cost_per_base_unit,
            result.ingredient.base_unit
        );
        ids.push((*name, result.ingredient.id));
    }

    let id_of = |name: &str| -> String {
        ids.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| id.clone())
            .unwrap_or_default()
    };

    // ------------------------------------------------------------------
    // Recipes
    // ------------------------------------------------------------------
    let recipes = RecipeService::new(db.clone());

    let cream = recipes
        .save(
            RecipeDraft {
                id: None,
                expected_revision: 0,
                name: "Pastry cream".to_string(),
                yield_units: Quantity::from_units(10),
                prep_minutes: 30,
                is_base: true,
                selling_price: None,
                price_reason: None,
                items: vec![
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Whole milk"),
                        quantity: Quantity::from_units(500),
                        unit: "ml".to_string(),
                    },
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Refined sugar"),
                        quantity: Quantity::from_units(150),
                        unit: "g".to_string(),
                    },
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Cornstarch"),
                        quantity: Quantity::from_units(40),
                        unit: "g".to_string(),
                    },
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Eggs"),
                        quantity: Quantity::from_units(4),
                        unit: "un".to_string(),
                    },
                ],
            },
            SEED_OPERATOR,
        )
        .await?;
    println!(
        "  + Pastry cream (base, unit cost {})",
        cream.recipe.unit_cost
    );

    let carolina = recipes
        .save(
            RecipeDraft {
                id: None,
                expected_revision: 0,
                name: "Carolina (cream puff)".to_string(),
                yield_units: Quantity::from_units(24),
                prep_minutes: 60,
                is_base: false,
                selling_price: Some(Money::from_cents(550)),
                price_reason: None,
                items: vec![
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Wheat flour"),
                        quantity: Quantity::from_units(2),
                        unit: "cup".to_string(),
                    },
                    RecipeItemDraft {
                        kind: ComponentKind::Ingredient,
                        component_id: id_of("Butter"),
                        quantity: Quantity::from_units(100),
                        unit: "g".to_string(),
                    },
                    RecipeItemDraft {
                        kind: ComponentKind::Recipe,
                        component_id: cream.recipe.id.clone(),
                        quantity: Quantity::from_units(5),
                        unit: "un".to_string(),
                    },
                ],
            },
            SEED_OPERATOR,
        )
        .await?;
    println!(
        "  + Carolina (unit cost {}, sells at {})",
        carolina.recipe.unit_cost,
        Money::from_cents(550)
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
