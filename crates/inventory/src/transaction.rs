use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{canonical, IngredientId, LedgerError, LedgerResult, OrderItemId, TransactionId};

use crate::ingredient::Ingredient;

/// Kind of stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Consumption,
    Waste,
    Adjustment,
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Consumption => "consumption",
            TransactionType::Waste => "waste",
            TransactionType::Adjustment => "adjustment",
        };
        f.write_str(s)
    }
}

/// Whether consumption may drive a balance below zero.
///
/// Default is `Reject`: a consumption that does not fit fails with
/// `InsufficientStock` and writes nothing. `Allow` lets the balance go
/// negative and leaves flagging to the reorder-level read path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackorderPolicy {
    #[default]
    Reject,
    Allow,
}

/// One immutable entry in an ingredient's ledger.
///
/// Entries are append-only; corrections are made by appending an offsetting
/// `adjustment` entry, never by editing or deleting. For every entry
/// `new_quantity - previous_quantity == quantity`, and the ingredient's
/// materialized balance equals the latest entry's `new_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: TransactionId,
    pub ingredient_id: IngredientId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Signed movement in the ingredient's canonical unit.
    pub quantity: Decimal,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    /// Idempotency reference for order-driven consumption.
    pub order_item_id: Option<OrderItemId>,
    pub notes: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Check the per-entry balance identity.
    pub fn is_balanced(&self) -> bool {
        self.new_quantity - self.previous_quantity == self.quantity
    }
}

/// A validated, not-yet-committed ledger entry.
///
/// Produced by `plan_transaction` from an ingredient snapshot; the store
/// commits it atomically against `expected_version` and assigns id/timestamp.
/// If the snapshot went stale in between, the commit fails with a conflict
/// and the caller replans from a fresh read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPlan {
    pub ingredient_id: IngredientId,
    pub kind: TransactionType,
    pub quantity: Decimal,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub order_item_id: Option<OrderItemId>,
    pub notes: Option<String>,
    pub actor: String,
    /// Ingredient version the plan was computed from.
    pub expected_version: u64,
    /// Cost per canonical unit to record alongside the balance update, if the
    /// movement changes it (purchases blend the average cost).
    pub new_cost_per_unit: Option<Decimal>,
}

/// Direction of a manual stock adjustment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Add,
    Remove,
}

/// Decide whether a signed movement is legal against an ingredient snapshot
/// and compute the resulting ledger entry.
///
/// The policy gate applies to consumption only: with `BackorderPolicy::Reject`
/// a consumption that would drive the balance negative fails with
/// `InsufficientStock` and nothing is written. Manual adjustments are
/// human-audited corrections and may take the balance wherever the count
/// says it is.
pub fn plan_transaction(
    ingredient: &Ingredient,
    kind: TransactionType,
    signed_quantity: Decimal,
    policy: BackorderPolicy,
    order_item_id: Option<OrderItemId>,
    notes: Option<String>,
    actor: impl Into<String>,
) -> LedgerResult<TransactionPlan> {
    let quantity = canonical(signed_quantity);

    if quantity == Decimal::ZERO {
        return Err(LedgerError::validation("transaction quantity cannot be zero"));
    }
    match kind {
        TransactionType::Purchase if quantity < Decimal::ZERO => {
            return Err(LedgerError::validation("purchase quantity must be positive"));
        }
        TransactionType::Consumption | TransactionType::Waste if quantity > Decimal::ZERO => {
            return Err(LedgerError::validation(format!(
                "{kind} quantity must be negative"
            )));
        }
        _ => {}
    }

    let previous_quantity = ingredient.stock_quantity;
    let new_quantity = canonical(previous_quantity + quantity);

    if kind == TransactionType::Consumption
        && new_quantity < Decimal::ZERO
        && policy == BackorderPolicy::Reject
    {
        return Err(LedgerError::insufficient_stock(
            ingredient.id,
            -quantity,
            previous_quantity,
        ));
    }

    Ok(TransactionPlan {
        ingredient_id: ingredient.id,
        kind,
        quantity,
        previous_quantity,
        new_quantity,
        order_item_id,
        notes,
        actor: actor.into(),
        expected_version: ingredient.version,
        new_cost_per_unit: None,
    })
}

/// Translate a manual add/remove adjustment into a signed `adjustment` entry.
pub fn plan_adjustment(
    ingredient: &Ingredient,
    direction: AdjustmentDirection,
    quantity: Decimal,
    notes: Option<String>,
    actor: impl Into<String>,
) -> LedgerResult<TransactionPlan> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "adjustment quantity must be positive",
        ));
    }
    let signed = match direction {
        AdjustmentDirection::Add => quantity,
        AdjustmentDirection::Remove => -quantity,
    };
    plan_transaction(
        ingredient,
        TransactionType::Adjustment,
        signed,
        // Policy gate applies to consumption only.
        BackorderPolicy::Allow,
        None,
        notes,
        actor,
    )
}

/// Translate a spoilage report into a negative `waste` entry.
pub fn plan_waste(
    ingredient: &Ingredient,
    quantity: Decimal,
    notes: Option<String>,
    actor: impl Into<String>,
) -> LedgerResult<TransactionPlan> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::validation("waste quantity must be positive"));
    }
    plan_transaction(
        ingredient,
        TransactionType::Waste,
        -quantity,
        BackorderPolicy::Allow,
        None,
        notes,
        actor,
    )
}
