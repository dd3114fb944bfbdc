//! `larder-infra` — persistence and the stock ledger service.
//!
//! The store owns all state of record and performs every balance update as
//! one atomic unit: transaction row + materialized balance together, or
//! neither. The `StockLedger` service on top is stateless; it plans movements
//! from a snapshot and retries when the snapshot lost the commit race.

pub mod ledger;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use ledger::{NewIngredient, StockLedger, DEFAULT_COMMIT_ATTEMPTS};
pub use store::{
    ConsumptionCommit, HistoryPage, HistoryQuery, InMemoryInventoryStore, InventoryStore,
    Pagination, TimeRange,
};
#[cfg(feature = "postgres")]
pub use store::postgres::PostgresInventoryStore;
