//! The stock ledger service: the one write path for ingredient balances.
//!
//! Stateless over an `InventoryStore`. Every mutation follows the same shape:
//! read a snapshot, plan the movement with the pure domain logic, hand the
//! plan to the store's conditional atomic commit, and replan on conflict up
//! to a bounded number of attempts.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use larder_core::{
    FoodItemId, IngredientId, LedgerError, LedgerResult, OrderItemId, RecipeId, UnitId,
};
use larder_inventory::{
    plan_adjustment, plan_transaction, plan_waste, AdjustmentDirection, BackorderPolicy,
    Ingredient, InventoryTransaction, TransactionPlan, TransactionType,
};
use larder_recipes::{
    compute_recipe_cost, plan_order_consumption, OrderItem, Recipe, RecipeCost, RecipeIngredient,
};
use larder_units::{MeasurementUnit, UnitRegistry, UnitType};

use crate::store::{ConsumptionCommit, HistoryPage, HistoryQuery, InventoryStore};

/// Bounded retries for conditional commits that lose the race.
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 5;

/// Parameters for registering a new ingredient.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub category: String,
    pub unit_id: UnitId,
    pub opening_stock: Decimal,
    pub reorder_level: Decimal,
    pub cost_per_unit: Decimal,
}

/// The stock ledger service.
///
/// Shared across request handlers; holds no state of record beyond the store
/// handle and the configured backorder policy.
#[derive(Debug)]
pub struct StockLedger<S: InventoryStore> {
    store: S,
    policy: BackorderPolicy,
    max_commit_attempts: u32,
}

impl<S: InventoryStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, BackorderPolicy::default())
    }

    pub fn with_policy(store: S, policy: BackorderPolicy) -> Self {
        Self {
            store,
            policy,
            max_commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    /// Override the bounded retry count for conditional commits.
    pub fn commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn policy(&self) -> BackorderPolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- catalog ---

    pub fn register_unit(
        &self,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        unit_type: UnitType,
        factor: Decimal,
    ) -> LedgerResult<MeasurementUnit> {
        let unit = MeasurementUnit::new(UnitId::new(), name, abbreviation, unit_type, factor)?;
        self.store.insert_unit(unit.clone())?;
        Ok(unit)
    }

    pub fn list_units(&self) -> LedgerResult<Vec<MeasurementUnit>> {
        self.store.list_units()
    }

    pub fn create_ingredient(&self, new: NewIngredient) -> LedgerResult<Ingredient> {
        // Fail before the insert if the canonical unit is unknown.
        self.store.unit(new.unit_id)?;
        let ingredient = Ingredient::new(
            IngredientId::new(),
            new.name,
            new.category,
            new.unit_id,
            new.opening_stock,
            new.reorder_level,
            new.cost_per_unit,
        )?;
        self.store.insert_ingredient(ingredient.clone())?;
        info!(ingredient_id = %ingredient.id, name = %ingredient.name, "ingredient registered");
        Ok(ingredient)
    }

    pub fn ingredient(&self, id: IngredientId) -> LedgerResult<Ingredient> {
        self.store.ingredient(id)
    }

    pub fn list_ingredients(&self) -> LedgerResult<Vec<Ingredient>> {
        self.store.list_ingredients()
    }

    pub fn set_ingredient_cost(&self, id: IngredientId, cost: Decimal) -> LedgerResult<()> {
        self.store.set_ingredient_cost(id, cost)
    }

    pub fn create_recipe(
        &self,
        food_item_id: FoodItemId,
        serves: u32,
        ingredients: Vec<RecipeIngredient>,
    ) -> LedgerResult<Recipe> {
        let recipe = Recipe::new(RecipeId::new(), food_item_id, serves, ingredients)?;
        self.store.insert_recipe(recipe.clone())?;
        Ok(recipe)
    }

    pub fn recipe(&self, id: RecipeId) -> LedgerResult<Recipe> {
        self.store.recipe(id)
    }

    // --- costing (read-only) ---

    /// Cost a recipe at current ingredient prices.
    ///
    /// Computed on demand; a concurrent ingredient cost change shows up on
    /// the next call, not in previously returned values.
    pub fn recipe_cost(&self, recipe_id: RecipeId) -> LedgerResult<RecipeCost> {
        let recipe = self.store.recipe(recipe_id)?;
        let registry = self.unit_registry()?;
        let ingredients = self.snapshot_ingredients(&recipe)?;
        compute_recipe_cost(&recipe, &registry, &ingredients)
    }

    // --- ledger writes ---

    /// Append a signed movement to an ingredient's ledger.
    #[instrument(skip(self, notes), fields(ingredient_id = %ingredient_id, kind = %kind))]
    pub fn append_transaction(
        &self,
        ingredient_id: IngredientId,
        kind: TransactionType,
        signed_quantity: Decimal,
        notes: Option<String>,
        actor: &str,
    ) -> LedgerResult<InventoryTransaction> {
        self.commit_with_retry(|ingredient| {
            plan_transaction(
                ingredient,
                kind,
                signed_quantity,
                self.policy,
                None,
                notes.clone(),
                actor,
            )
        }, ingredient_id)
    }

    /// Manual add/remove adjustment from the inventory dialog.
    #[instrument(skip(self, note), fields(ingredient_id = %ingredient_id, ?direction))]
    pub fn adjust_stock(
        &self,
        ingredient_id: IngredientId,
        direction: AdjustmentDirection,
        quantity: Decimal,
        note: Option<String>,
        actor: &str,
    ) -> LedgerResult<InventoryTransaction> {
        self.commit_with_retry(
            |ingredient| plan_adjustment(ingredient, direction, quantity, note.clone(), actor),
            ingredient_id,
        )
    }

    /// Record spoilage as a negative `waste` entry.
    #[instrument(skip(self, note), fields(ingredient_id = %ingredient_id))]
    pub fn record_waste(
        &self,
        ingredient_id: IngredientId,
        quantity: Decimal,
        note: Option<String>,
        actor: &str,
    ) -> LedgerResult<InventoryTransaction> {
        self.commit_with_retry(
            |ingredient| plan_waste(ingredient, quantity, note.clone(), actor),
            ingredient_id,
        )
    }

    /// Record a delivery as a positive `purchase` entry.
    ///
    /// With a `unit_cost`, the ingredient's cost per canonical unit becomes
    /// the weighted average of the stock on hand and the delivery.
    #[instrument(skip(self, note), fields(ingredient_id = %ingredient_id))]
    pub fn record_purchase(
        &self,
        ingredient_id: IngredientId,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        note: Option<String>,
        actor: &str,
    ) -> LedgerResult<InventoryTransaction> {
        if let Some(cost) = unit_cost {
            if cost < Decimal::ZERO {
                return Err(LedgerError::validation("unit cost cannot be negative"));
            }
        }
        self.commit_with_retry(
            |ingredient| {
                let mut plan = plan_transaction(
                    ingredient,
                    TransactionType::Purchase,
                    quantity,
                    self.policy,
                    None,
                    note.clone(),
                    actor,
                )?;
                plan.new_cost_per_unit = unit_cost.map(|c| ingredient.blended_cost(quantity, c));
                Ok(plan)
            },
            ingredient_id,
        )
    }

    /// Deduct an order line's recipe ingredients, exactly once per order item.
    ///
    /// Idempotent on `order_item.id`: a retry gets `AlreadyApplied` carrying
    /// the consumption set the first call produced, so callers can tell a
    /// fresh deduction from a replay. All-or-nothing: if any ingredient lacks
    /// stock, nothing is deducted and the whole call fails with
    /// `InsufficientStock`.
    #[instrument(skip(self), fields(order_item_id = %order_item.id, food_item_id = %order_item.food_item_id))]
    pub fn apply_order_item_consumption(
        &self,
        order_item: &OrderItem,
        actor: &str,
    ) -> LedgerResult<ConsumptionCommit> {
        // Fast path for retries; the store re-checks under its own lock.
        let existing = self.store.consumption_for_order_item(order_item.id)?;
        if !existing.is_empty() {
            debug!("consumption already applied, returning existing entries");
            return Ok(ConsumptionCommit::AlreadyApplied(existing));
        }

        let recipe = self.store.recipe_for_food_item(order_item.food_item_id)?;
        let registry = self.unit_registry()?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let ingredients = self.snapshot_ingredients(&recipe)?;
            let lines = plan_order_consumption(order_item, &recipe, &registry, &ingredients)?;

            let mut plans = Vec::with_capacity(lines.len());
            for line in &lines {
                let ingredient = ingredients
                    .get(&line.ingredient_id)
                    .ok_or_else(|| LedgerError::unknown("ingredient", line.ingredient_id))?;
                plans.push(plan_transaction(
                    ingredient,
                    TransactionType::Consumption,
                    -line.quantity,
                    self.policy,
                    Some(order_item.id),
                    None,
                    actor,
                )?);
            }

            match self.store.commit_consumption(order_item.id, plans) {
                Ok(ConsumptionCommit::Applied(txs)) => {
                    info!(entries = txs.len(), "order consumption applied");
                    return Ok(ConsumptionCommit::Applied(txs));
                }
                Ok(ConsumptionCommit::AlreadyApplied(txs)) => {
                    debug!("lost idempotency race, returning existing entries");
                    return Ok(ConsumptionCommit::AlreadyApplied(txs));
                }
                Err(LedgerError::ConcurrencyConflict(reason))
                    if attempt < self.max_commit_attempts =>
                {
                    warn!(attempt, %reason, "consumption commit conflicted, replanning");
                }
                Err(err) => return Err(err),
            }
        }
    }

    // --- reads ---

    /// Paginated ledger history for an ingredient, newest first.
    pub fn history(
        &self,
        ingredient_id: IngredientId,
        query: &HistoryQuery,
    ) -> LedgerResult<HistoryPage> {
        self.store.history(ingredient_id, query)
    }

    pub fn consumption_for_order_item(
        &self,
        order_item_id: OrderItemId,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        self.store.consumption_for_order_item(order_item_id)
    }

    // --- internals ---

    fn unit_registry(&self) -> LedgerResult<UnitRegistry> {
        Ok(UnitRegistry::from_units(self.store.list_units()?))
    }

    fn snapshot_ingredients(
        &self,
        recipe: &Recipe,
    ) -> LedgerResult<HashMap<IngredientId, Ingredient>> {
        let mut map = HashMap::with_capacity(recipe.ingredients.len());
        for line in &recipe.ingredients {
            if !map.contains_key(&line.ingredient_id) {
                map.insert(line.ingredient_id, self.store.ingredient(line.ingredient_id)?);
            }
        }
        Ok(map)
    }

    fn commit_with_retry(
        &self,
        mut plan_fn: impl FnMut(&Ingredient) -> LedgerResult<TransactionPlan>,
        ingredient_id: IngredientId,
    ) -> LedgerResult<InventoryTransaction> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let ingredient = self.store.ingredient(ingredient_id)?;
            let plan = plan_fn(&ingredient)?;

            match self.store.commit_transaction(plan) {
                Ok(entry) => {
                    info!(
                        ingredient_id = %ingredient_id,
                        kind = %entry.kind,
                        quantity = %entry.quantity,
                        new_quantity = %entry.new_quantity,
                        "ledger entry committed"
                    );
                    return Ok(entry);
                }
                Err(LedgerError::ConcurrencyConflict(reason))
                    if attempt < self.max_commit_attempts =>
                {
                    warn!(attempt, %reason, "commit conflicted, replanning from fresh read");
                }
                Err(err) => return Err(err),
            }
        }
    }
}
