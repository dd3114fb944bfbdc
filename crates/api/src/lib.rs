//! HTTP surface of the stock ledger: routing and request/response mapping.
//!
//! Terminals (waiter, kitchen, admin) are plain HTTP callers; all state of
//! record lives behind the `StockLedger` service.

pub mod app;
