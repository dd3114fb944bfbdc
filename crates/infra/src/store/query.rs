//! History query types.
//!
//! Ledger history is read-only, newest first, and paginated by default: every
//! page is finite and the same query can be re-issued safely after a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use larder_inventory::InventoryTransaction;

/// Pagination parameters for history queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Offset from the newest entry (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(500), // cap page size
            offset: offset.unwrap_or(0),
        }
    }
}

/// Optional time bounds on a history query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeRange {
    /// Entries created strictly after this instant.
    pub after: Option<DateTime<Utc>>,
    /// Entries created strictly before this instant.
    pub before: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(after) = self.after {
            if at <= after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if at >= before {
                return false;
            }
        }
        true
    }
}

/// Complete history query: range + page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub range: TimeRange,
    pub pagination: Pagination,
}

/// One page of an ingredient's ledger, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub transactions: Vec<InventoryTransaction>,
    /// Total entries matching the range (across all pages).
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}
