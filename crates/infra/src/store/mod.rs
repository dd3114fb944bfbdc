//! Backing-store abstraction for the stock ledger.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;
#[allow(clippy::module_inception)]
mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use query::{HistoryPage, HistoryQuery, Pagination, TimeRange};
pub use r#trait::{ConsumptionCommit, InventoryStore};
