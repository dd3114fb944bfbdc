use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;

use larder_core::{
    FoodItemId, IngredientId, LedgerError, LedgerResult, OrderItemId, RecipeId, TransactionId,
    UnitId,
};
use larder_inventory::{Ingredient, InventoryTransaction, TransactionPlan};
use larder_recipes::Recipe;
use larder_units::MeasurementUnit;

use super::query::{HistoryPage, HistoryQuery};
use super::r#trait::{ConsumptionCommit, InventoryStore};

#[derive(Debug, Default)]
struct Inner {
    units: HashMap<UnitId, MeasurementUnit>,
    ingredients: HashMap<IngredientId, Ingredient>,
    recipes: HashMap<RecipeId, Recipe>,
    recipe_by_food_item: HashMap<FoodItemId, RecipeId>,
    /// Append order is creation order.
    transactions: Vec<InventoryTransaction>,
    consumption_by_order_item: HashMap<OrderItemId, Vec<TransactionId>>,
}

/// In-memory backing store.
///
/// Intended for tests/dev and single-process deployments. All commits happen
/// under one write lock, which makes the conditional version check and the
/// balance update a single critical section.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::persistence("store lock poisoned"))
    }

    fn write(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::persistence("store lock poisoned"))
    }
}

/// Validate a plan against current state and produce the stored entry.
///
/// Caller must hold the write lock; nothing is mutated here so a batch can
/// be validated completely before any line is applied.
fn check_plan(inner: &Inner, plan: &TransactionPlan) -> LedgerResult<InventoryTransaction> {
    let ingredient = inner
        .ingredients
        .get(&plan.ingredient_id)
        .ok_or_else(|| LedgerError::unknown("ingredient", plan.ingredient_id))?;

    if ingredient.version != plan.expected_version {
        return Err(LedgerError::conflict(format!(
            "ingredient {} is at version {}, plan expected {}",
            plan.ingredient_id, ingredient.version, plan.expected_version
        )));
    }
    // With matching versions the snapshot balance must match too; a mismatch
    // means the plan was built against corrupted state.
    if ingredient.stock_quantity != plan.previous_quantity {
        return Err(LedgerError::conflict(format!(
            "ingredient {} balance is {}, plan expected {}",
            plan.ingredient_id, ingredient.stock_quantity, plan.previous_quantity
        )));
    }

    Ok(InventoryTransaction {
        id: TransactionId::new(),
        ingredient_id: plan.ingredient_id,
        kind: plan.kind,
        quantity: plan.quantity,
        previous_quantity: plan.previous_quantity,
        new_quantity: plan.new_quantity,
        order_item_id: plan.order_item_id,
        notes: plan.notes.clone(),
        actor: plan.actor.clone(),
        created_at: Utc::now(),
    })
}

/// Apply an already-checked entry: append + update the materialized balance.
fn apply_entry(inner: &mut Inner, entry: InventoryTransaction, new_cost: Option<Decimal>) {
    if let Some(ingredient) = inner.ingredients.get_mut(&entry.ingredient_id) {
        ingredient.stock_quantity = entry.new_quantity;
        ingredient.version += 1;
        if let Some(cost) = new_cost {
            ingredient.cost_per_unit = cost;
        }
    }
    inner.transactions.push(entry);
}

impl InventoryStore for InMemoryInventoryStore {
    fn insert_unit(&self, unit: MeasurementUnit) -> LedgerResult<()> {
        let mut inner = self.write()?;
        if inner.units.contains_key(&unit.id) {
            return Err(LedgerError::validation(format!(
                "unit {} already registered",
                unit.id
            )));
        }
        inner.units.insert(unit.id, unit);
        Ok(())
    }

    fn unit(&self, id: UnitId) -> LedgerResult<MeasurementUnit> {
        self.read()?
            .units
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::unknown("unit", id))
    }

    fn list_units(&self) -> LedgerResult<Vec<MeasurementUnit>> {
        Ok(self.read()?.units.values().cloned().collect())
    }

    fn insert_ingredient(&self, ingredient: Ingredient) -> LedgerResult<()> {
        let mut inner = self.write()?;
        if inner.ingredients.contains_key(&ingredient.id) {
            return Err(LedgerError::validation(format!(
                "ingredient {} already registered",
                ingredient.id
            )));
        }
        if !inner.units.contains_key(&ingredient.unit_id) {
            return Err(LedgerError::unknown("unit", ingredient.unit_id));
        }
        inner.ingredients.insert(ingredient.id, ingredient);
        Ok(())
    }

    fn ingredient(&self, id: IngredientId) -> LedgerResult<Ingredient> {
        self.read()?
            .ingredients
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::unknown("ingredient", id))
    }

    fn list_ingredients(&self) -> LedgerResult<Vec<Ingredient>> {
        let mut ingredients: Vec<_> = self.read()?.ingredients.values().cloned().collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ingredients)
    }

    fn set_ingredient_cost(&self, id: IngredientId, cost_per_unit: Decimal) -> LedgerResult<()> {
        if cost_per_unit < Decimal::ZERO {
            return Err(LedgerError::validation("cost per unit cannot be negative"));
        }
        let mut inner = self.write()?;
        let ingredient = inner
            .ingredients
            .get_mut(&id)
            .ok_or_else(|| LedgerError::unknown("ingredient", id))?;
        ingredient.cost_per_unit = cost_per_unit;
        Ok(())
    }

    fn insert_recipe(&self, recipe: Recipe) -> LedgerResult<()> {
        let mut inner = self.write()?;
        if inner.recipes.contains_key(&recipe.id) {
            return Err(LedgerError::validation(format!(
                "recipe {} already registered",
                recipe.id
            )));
        }
        for line in &recipe.ingredients {
            if !inner.ingredients.contains_key(&line.ingredient_id) {
                return Err(LedgerError::unknown("ingredient", line.ingredient_id));
            }
            if !inner.units.contains_key(&line.unit_id) {
                return Err(LedgerError::unknown("unit", line.unit_id));
            }
        }
        inner.recipe_by_food_item.insert(recipe.food_item_id, recipe.id);
        inner.recipes.insert(recipe.id, recipe);
        Ok(())
    }

    fn recipe(&self, id: RecipeId) -> LedgerResult<Recipe> {
        self.read()?
            .recipes
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::unknown("recipe", id))
    }

    fn recipe_for_food_item(&self, food_item_id: FoodItemId) -> LedgerResult<Recipe> {
        let inner = self.read()?;
        inner
            .recipe_by_food_item
            .get(&food_item_id)
            .and_then(|id| inner.recipes.get(id))
            .cloned()
            .ok_or_else(|| LedgerError::unknown("recipe for food item", food_item_id))
    }

    fn commit_transaction(&self, plan: TransactionPlan) -> LedgerResult<InventoryTransaction> {
        let mut inner = self.write()?;
        let entry = check_plan(&inner, &plan)?;
        apply_entry(&mut inner, entry.clone(), plan.new_cost_per_unit);
        Ok(entry)
    }

    fn commit_consumption(
        &self,
        order_item_id: OrderItemId,
        plans: Vec<TransactionPlan>,
    ) -> LedgerResult<ConsumptionCommit> {
        if plans.is_empty() {
            return Err(LedgerError::validation(
                "consumption commit requires at least one line",
            ));
        }

        let mut inner = self.write()?;

        // Idempotency check inside the critical section: a concurrent retry
        // sees either nothing or the full committed set, never half of one.
        if inner.consumption_by_order_item.contains_key(&order_item_id) {
            drop(inner);
            return Ok(ConsumptionCommit::AlreadyApplied(
                self.consumption_for_order_item(order_item_id)?,
            ));
        }

        // Validate every line before applying any: all or nothing. One line
        // per ingredient, otherwise the later apply would clobber the earlier
        // balance.
        let mut entries = Vec::with_capacity(plans.len());
        for (idx, plan) in plans.iter().enumerate() {
            if plans[..idx]
                .iter()
                .any(|p| p.ingredient_id == plan.ingredient_id)
            {
                return Err(LedgerError::validation(format!(
                    "duplicate ingredient {} in consumption batch",
                    plan.ingredient_id
                )));
            }
            entries.push(check_plan(&inner, plan)?);
        }

        let ids = entries.iter().map(|e| e.id).collect();
        for entry in &entries {
            apply_entry(&mut inner, entry.clone(), None);
        }
        inner.consumption_by_order_item.insert(order_item_id, ids);

        Ok(ConsumptionCommit::Applied(entries))
    }

    fn consumption_for_order_item(
        &self,
        order_item_id: OrderItemId,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        let inner = self.read()?;
        let Some(ids) = inner.consumption_by_order_item.get(&order_item_id) else {
            return Ok(vec![]);
        };
        Ok(inner
            .transactions
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    fn history(
        &self,
        ingredient_id: IngredientId,
        query: &HistoryQuery,
    ) -> LedgerResult<HistoryPage> {
        let inner = self.read()?;
        if !inner.ingredients.contains_key(&ingredient_id) {
            return Err(LedgerError::unknown("ingredient", ingredient_id));
        }

        // Newest first: reverse of append order.
        let matching: Vec<_> = inner
            .transactions
            .iter()
            .rev()
            .filter(|t| t.ingredient_id == ingredient_id && query.range.contains(t.created_at))
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let offset = query.pagination.offset as usize;
        let limit = query.pagination.limit as usize;
        let transactions: Vec<_> = matching.into_iter().skip(offset).take(limit).collect();
        let has_more = (offset + transactions.len()) < total as usize;

        Ok(HistoryPage {
            transactions,
            total,
            pagination: query.pagination,
            has_more,
        })
    }
}
