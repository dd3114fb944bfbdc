use rust_decimal::Decimal;

use larder_core::{FoodItemId, IngredientId, LedgerResult, OrderItemId, RecipeId, UnitId};
use larder_inventory::{Ingredient, InventoryTransaction, TransactionPlan};
use larder_recipes::Recipe;
use larder_units::MeasurementUnit;

use super::query::{HistoryPage, HistoryQuery};

/// Outcome of an order-item consumption commit.
///
/// `AlreadyApplied` is the idempotent path: a consumption set for this
/// `order_item_id` already exists and the commit was a no-op returning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumptionCommit {
    Applied(Vec<InventoryTransaction>),
    AlreadyApplied(Vec<InventoryTransaction>),
}

impl ConsumptionCommit {
    pub fn into_transactions(self) -> Vec<InventoryTransaction> {
        match self {
            Self::Applied(txs) | Self::AlreadyApplied(txs) => txs,
        }
    }
}

/// The single point of truth for ingredient state and ledger history.
///
/// ## Commit semantics
///
/// `commit_transaction` persists the ledger entry and updates the
/// ingredient's materialized balance as **one atomic unit**: both become
/// visible together or neither does, even under concurrent callers. The
/// commit is conditional on the plan's `expected_version`; a stale plan
/// fails with `ConcurrencyConflict` and writes nothing, and the caller
/// replans from a fresh read. This keeps per-ingredient history linearizable:
/// entry N+1 is always computed from the balance entry N left behind.
///
/// `commit_consumption` extends the same guarantee across a batch:
/// either every line of an order item is applied or none is, and the
/// `order_item_id` idempotency check happens inside the same critical
/// section, so a retry can never double-deduct.
///
/// ## Append-only
///
/// There is no update or delete for transactions; corrections are new,
/// offsetting `adjustment` entries. Ingredients referenced by history are
/// never removed.
pub trait InventoryStore: Send + Sync {
    // --- unit catalog ---

    fn insert_unit(&self, unit: MeasurementUnit) -> LedgerResult<()>;
    fn unit(&self, id: UnitId) -> LedgerResult<MeasurementUnit>;
    fn list_units(&self) -> LedgerResult<Vec<MeasurementUnit>>;

    // --- ingredients ---

    fn insert_ingredient(&self, ingredient: Ingredient) -> LedgerResult<()>;
    fn ingredient(&self, id: IngredientId) -> LedgerResult<Ingredient>;
    fn list_ingredients(&self) -> LedgerResult<Vec<Ingredient>>;
    /// Update the cost used by future costing/deduction. Past entries keep
    /// the costs they were recorded under.
    fn set_ingredient_cost(&self, id: IngredientId, cost_per_unit: Decimal) -> LedgerResult<()>;

    // --- recipes ---

    fn insert_recipe(&self, recipe: Recipe) -> LedgerResult<()>;
    fn recipe(&self, id: RecipeId) -> LedgerResult<Recipe>;
    fn recipe_for_food_item(&self, food_item_id: FoodItemId) -> LedgerResult<Recipe>;

    // --- ledger ---

    /// Atomically append one entry and update the materialized balance,
    /// conditional on `plan.expected_version`.
    fn commit_transaction(&self, plan: TransactionPlan) -> LedgerResult<InventoryTransaction>;

    /// Atomically append a consumption set for an order item: all lines or
    /// none, idempotent on `order_item_id`.
    fn commit_consumption(
        &self,
        order_item_id: OrderItemId,
        plans: Vec<TransactionPlan>,
    ) -> LedgerResult<ConsumptionCommit>;

    /// Consumption entries already recorded for an order item, if any.
    fn consumption_for_order_item(
        &self,
        order_item_id: OrderItemId,
    ) -> LedgerResult<Vec<InventoryTransaction>>;

    /// Paginated ledger history for one ingredient, newest first.
    fn history(&self, ingredient_id: IngredientId, query: &HistoryQuery)
        -> LedgerResult<HistoryPage>;
}
