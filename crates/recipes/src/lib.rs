//! `larder-recipes` — recipe costing and order-driven consumption planning.
//!
//! Both halves are read-only over ingredient state: costing derives a price
//! from current ingredient costs, deduction planning derives the canonical
//! quantities an order line requires. Neither writes; the ledger service in
//! `larder-infra` commits planned consumption atomically.

pub mod costing;
pub mod deduction;
pub mod recipe;

pub use costing::{compute_recipe_cost, IngredientLookup, RecipeCost};
pub use deduction::{plan_order_consumption, ConsumptionLine, OrderItem};
pub use recipe::{Recipe, RecipeIngredient};
