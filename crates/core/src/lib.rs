//! `larder-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the ledger,
//! unit, and recipe crates (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod quantity;

pub use error::{LedgerError, LedgerResult};
pub use id::{FoodItemId, IngredientId, OrderItemId, RecipeId, TransactionId, UnitId};
pub use quantity::{canonical, display, CANONICAL_SCALE, DISPLAY_SCALE};
