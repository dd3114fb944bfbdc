use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{canonical, IngredientId, LedgerError, LedgerResult, UnitId};

/// An ingredient with its materialized stock balance.
///
/// Owned by the ledger for mutation; everything else reads. `stock_quantity`
/// is always expressed in the ingredient's canonical unit (`unit_id`) and
/// must equal the `new_quantity` of the most recent ledger entry. `version`
/// counts applied ledger entries and drives optimistic concurrency in the
/// store.
///
/// Ingredients referenced by transactions or recipes are never hard-deleted;
/// history stays auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub category: String,
    /// Canonical unit all ledger arithmetic for this ingredient happens in.
    pub unit_id: UnitId,
    /// Materialized balance, canonical units.
    pub stock_quantity: Decimal,
    pub reorder_level: Decimal,
    /// Cost per canonical unit.
    pub cost_per_unit: Decimal,
    /// Number of ledger entries applied to this ingredient.
    pub version: u64,
}

impl Ingredient {
    pub fn new(
        id: IngredientId,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_id: UnitId,
        opening_stock: Decimal,
        reorder_level: Decimal,
        cost_per_unit: Decimal,
    ) -> LedgerResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::validation("ingredient name cannot be empty"));
        }
        if opening_stock < Decimal::ZERO {
            return Err(LedgerError::validation("opening stock cannot be negative"));
        }
        if reorder_level < Decimal::ZERO {
            return Err(LedgerError::validation("reorder level cannot be negative"));
        }
        if cost_per_unit < Decimal::ZERO {
            return Err(LedgerError::validation("cost per unit cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            category: category.into(),
            unit_id,
            stock_quantity: canonical(opening_stock),
            reorder_level: canonical(reorder_level),
            cost_per_unit: canonical(cost_per_unit),
            version: 0,
        })
    }

    /// Whether the balance has fallen to or below the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }

    /// Weighted-average cost after receiving `quantity` at `unit_cost`.
    ///
    /// Used by the purchase path so the costed value of stock on hand stays
    /// consistent across deliveries at different prices.
    pub fn blended_cost(&self, quantity: Decimal, unit_cost: Decimal) -> Decimal {
        let new_qty = self.stock_quantity + quantity;
        if new_qty <= Decimal::ZERO {
            return self.cost_per_unit;
        }
        let current_value = self.stock_quantity.max(Decimal::ZERO) * self.cost_per_unit;
        let incoming_value = quantity * unit_cost;
        canonical((current_value + incoming_value) / new_qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn beef() -> Ingredient {
        Ingredient::new(
            IngredientId::new(),
            "Beef",
            "Meat",
            UnitId::new(),
            dec!(10),
            dec!(2),
            dec!(8.50),
        )
        .unwrap()
    }

    #[test]
    fn rejects_negative_opening_stock() {
        let err = Ingredient::new(
            IngredientId::new(),
            "Beef",
            "Meat",
            UnitId::new(),
            dec!(-1),
            dec!(0),
            dec!(0),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn reorder_flag_triggers_at_level() {
        let mut ingredient = beef();
        assert!(!ingredient.needs_reorder());
        ingredient.stock_quantity = dec!(2);
        assert!(ingredient.needs_reorder());
    }

    #[test]
    fn blended_cost_averages_by_value() {
        // 10 kg at 8.50 + 10 kg at 10.50 -> 20 kg at 9.50.
        let ingredient = beef();
        assert_eq!(ingredient.blended_cost(dec!(10), dec!(10.50)), dec!(9.50));
    }

    #[test]
    fn blended_cost_keeps_old_cost_when_balance_stays_non_positive() {
        let mut ingredient = beef();
        ingredient.stock_quantity = dec!(-5);
        assert_eq!(ingredient.blended_cost(dec!(5), dec!(99)), dec!(8.50));
    }
}
