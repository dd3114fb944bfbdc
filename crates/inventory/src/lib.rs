//! `larder-inventory` — ingredient state and the ledger's pure decision logic.
//!
//! The ledger is an append-only sequence of `InventoryTransaction` records per
//! ingredient; `Ingredient::stock_quantity` is the materialized balance and
//! must always equal the latest entry's `new_quantity`. This crate holds the
//! pure half of that contract: given an ingredient snapshot and a requested
//! movement, decide whether it is legal and what the resulting entry looks
//! like. Committing the entry atomically is the store's job (`larder-infra`).

pub mod ingredient;
pub mod transaction;

pub use ingredient::Ingredient;
pub use transaction::{
    plan_adjustment, plan_transaction, plan_waste, AdjustmentDirection, BackorderPolicy,
    InventoryTransaction, TransactionPlan, TransactionType,
};
