//! # Repository Module
//!
//! Database repository implementations for Forno.
//!
//! ## Repository Pattern
//! Each aggregate gets one repository with a narrow API; SQL is isolated
//! here and never leaks into services or UI layers. Repositories hold a
//! cloned pool handle, so they are cheap to create per call.
//!
//! ## Available Repositories
//!
//! - [`ingredient::IngredientRepository`] - Ingredient CRUD, conversions, stock
//! - [`recipe::RecipeRepository`] - Recipes, items, cost writes, dependency queries
//! - [`settings::SettingsRepository`] - Settings singleton + employee roster
//! - [`price_history::PriceHistoryRepository`] - Append-only audit trail
//! - [`session::CashSessionRepository`] - Cash drawer sessions
//! - [`order::OrderRepository`] - Orders (transaction-only writes)

pub mod ingredient;
pub mod order;
pub mod price_history;
pub mod recipe;
pub mod session;
pub mod settings;
