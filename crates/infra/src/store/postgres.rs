//! Postgres-backed inventory store.
//!
//! The balance update and the ledger insert run inside one database
//! transaction; the update is conditional on the ingredient's `version`
//! column, so a stale plan affects zero rows and the commit fails with
//! `ConcurrencyConflict` instead of overwriting a newer balance. A partial
//! unique index on `(order_item_id, ingredient_id)` backs the idempotency
//! key: even two perfectly interleaved consumption commits cannot both
//! insert.
//!
//! ## Error mapping
//!
//! | Postgres error | `LedgerError` |
//! |---|---|
//! | unique violation (23505) | `ConcurrencyConflict` (idempotency/version race) |
//! | serialization failure (40001) | `ConcurrencyConflict` |
//! | anything else | `Persistence` |
//!
//! The sync `InventoryStore` impl bridges into the async pool via the
//! current tokio runtime handle; call it from a blocking context
//! (`spawn_blocking`), or use the async methods directly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use larder_core::{
    FoodItemId, IngredientId, LedgerError, LedgerResult, OrderItemId, RecipeId, TransactionId,
    UnitId,
};
use larder_inventory::{Ingredient, InventoryTransaction, TransactionPlan, TransactionType};
use larder_recipes::{Recipe, RecipeIngredient};
use larder_units::{MeasurementUnit, UnitType};

use super::query::{HistoryPage, HistoryQuery};
use super::r#trait::{ConsumptionCommit, InventoryStore};

/// Postgres-backed implementation of `InventoryStore`.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a bounded acquire timeout so a dead database surfaces as
    /// a retryable `Persistence` error instead of hanging a terminal.
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await.map_err(map_sqlx)?;
        }
        Ok(())
    }

    // --- async operations ---

    pub async fn insert_unit_async(&self, unit: MeasurementUnit) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO measurement_units (id, name, abbreviation, unit_type, factor)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*unit.id.as_uuid())
        .bind(&unit.name)
        .bind(&unit.abbreviation)
        .bind(unit_type_str(unit.unit_type))
        .bind(unit.factor)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    pub async fn unit_async(&self, id: UnitId) -> LedgerResult<MeasurementUnit> {
        let row = sqlx::query(
            "SELECT id, name, abbreviation, unit_type, factor
             FROM measurement_units WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| LedgerError::unknown("unit", id))?;
        row_to_unit(&row)
    }

    pub async fn list_units_async(&self) -> LedgerResult<Vec<MeasurementUnit>> {
        let rows = sqlx::query(
            "SELECT id, name, abbreviation, unit_type, factor
             FROM measurement_units ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(row_to_unit).collect()
    }

    pub async fn insert_ingredient_async(&self, ingredient: Ingredient) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO ingredients
               (id, name, category, unit_id, stock_quantity, reorder_level, cost_per_unit, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*ingredient.id.as_uuid())
        .bind(&ingredient.name)
        .bind(&ingredient.category)
        .bind(*ingredient.unit_id.as_uuid())
        .bind(ingredient.stock_quantity)
        .bind(ingredient.reorder_level)
        .bind(ingredient.cost_per_unit)
        .bind(ingredient.version as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    pub async fn ingredient_async(&self, id: IngredientId) -> LedgerResult<Ingredient> {
        let row = sqlx::query(
            "SELECT id, name, category, unit_id, stock_quantity, reorder_level, cost_per_unit, version
             FROM ingredients WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| LedgerError::unknown("ingredient", id))?;
        row_to_ingredient(&row)
    }

    pub async fn list_ingredients_async(&self) -> LedgerResult<Vec<Ingredient>> {
        let rows = sqlx::query(
            "SELECT id, name, category, unit_id, stock_quantity, reorder_level, cost_per_unit, version
             FROM ingredients ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(row_to_ingredient).collect()
    }

    pub async fn set_ingredient_cost_async(
        &self,
        id: IngredientId,
        cost_per_unit: Decimal,
    ) -> LedgerResult<()> {
        if cost_per_unit < Decimal::ZERO {
            return Err(LedgerError::validation("cost per unit cannot be negative"));
        }
        let result = sqlx::query("UPDATE ingredients SET cost_per_unit = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(cost_per_unit)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::unknown("ingredient", id));
        }
        Ok(())
    }

    pub async fn insert_recipe_async(&self, recipe: Recipe) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        sqlx::query("INSERT INTO recipes (id, food_item_id, serves) VALUES ($1, $2, $3)")
            .bind(*recipe.id.as_uuid())
            .bind(*recipe.food_item_id.as_uuid())
            .bind(recipe.serves as i32)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        for (position, line) in recipe.ingredients.iter().enumerate() {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, position, ingredient_id, quantity, unit_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(*recipe.id.as_uuid())
            .bind(position as i32)
            .bind(*line.ingredient_id.as_uuid())
            .bind(line.quantity)
            .bind(*line.unit_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)
    }

    pub async fn recipe_async(&self, id: RecipeId) -> LedgerResult<Recipe> {
        let row = sqlx::query("SELECT id, food_item_id, serves FROM recipes WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| LedgerError::unknown("recipe", id))?;
        self.hydrate_recipe(&row).await
    }

    pub async fn recipe_for_food_item_async(&self, food_item_id: FoodItemId) -> LedgerResult<Recipe> {
        let row = sqlx::query("SELECT id, food_item_id, serves FROM recipes WHERE food_item_id = $1")
            .bind(*food_item_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| LedgerError::unknown("recipe for food item", food_item_id))?;
        self.hydrate_recipe(&row).await
    }

    async fn hydrate_recipe(&self, recipe_row: &PgRow) -> LedgerResult<Recipe> {
        let id: Uuid = recipe_row.try_get("id").map_err(map_sqlx)?;
        let food_item_id: Uuid = recipe_row.try_get("food_item_id").map_err(map_sqlx)?;
        let serves: i32 = recipe_row.try_get("serves").map_err(map_sqlx)?;

        let rows = sqlx::query(
            "SELECT ingredient_id, quantity, unit_id
             FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let mut ingredients = Vec::with_capacity(rows.len());
        for row in &rows {
            let ingredient_id: Uuid = row.try_get("ingredient_id").map_err(map_sqlx)?;
            let unit_id: Uuid = row.try_get("unit_id").map_err(map_sqlx)?;
            ingredients.push(RecipeIngredient {
                ingredient_id: IngredientId::from_uuid(ingredient_id),
                quantity: row.try_get("quantity").map_err(map_sqlx)?,
                unit_id: UnitId::from_uuid(unit_id),
            });
        }

        Ok(Recipe {
            id: RecipeId::from_uuid(id),
            food_item_id: FoodItemId::from_uuid(food_item_id),
            serves: serves.max(0) as u32,
            ingredients,
        })
    }

    #[instrument(skip(self, plan), fields(ingredient_id = %plan.ingredient_id))]
    pub async fn commit_transaction_async(
        &self,
        plan: TransactionPlan,
    ) -> LedgerResult<InventoryTransaction> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let entry = apply_plan(&mut tx, &plan).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(entry)
    }

    #[instrument(skip(self, plans), fields(order_item_id = %order_item_id, lines = plans.len()))]
    pub async fn commit_consumption_async(
        &self,
        order_item_id: OrderItemId,
        plans: Vec<TransactionPlan>,
    ) -> LedgerResult<ConsumptionCommit> {
        if plans.is_empty() {
            return Err(LedgerError::validation(
                "consumption commit requires at least one line",
            ));
        }

        let existing = self.consumption_for_order_item_async(order_item_id).await?;
        if !existing.is_empty() {
            return Ok(ConsumptionCommit::AlreadyApplied(existing));
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let mut entries = Vec::with_capacity(plans.len());
        for plan in &plans {
            // A duplicate consumption racing past the check above trips the
            // partial unique index and rolls the whole transaction back.
            entries.push(apply_plan(&mut tx, plan).await?);
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(ConsumptionCommit::Applied(entries))
    }

    pub async fn consumption_for_order_item_async(
        &self,
        order_item_id: OrderItemId,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query(
            "SELECT id, ingredient_id, kind, quantity, previous_quantity, new_quantity,
                    order_item_id, notes, actor, created_at
             FROM inventory_transactions
             WHERE order_item_id = $1
             ORDER BY created_at, id",
        )
        .bind(*order_item_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(row_to_transaction).collect()
    }

    pub async fn history_async(
        &self,
        ingredient_id: IngredientId,
        query: &HistoryQuery,
    ) -> LedgerResult<HistoryPage> {
        // Validate existence first so an empty page is distinguishable from
        // an unknown ingredient.
        self.ingredient_async(ingredient_id).await?;

        let after: Option<DateTime<Utc>> = query.range.after;
        let before: Option<DateTime<Utc>> = query.range.before;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_transactions
             WHERE ingredient_id = $1
               AND ($2::timestamptz IS NULL OR created_at > $2)
               AND ($3::timestamptz IS NULL OR created_at < $3)",
        )
        .bind(*ingredient_id.as_uuid())
        .bind(after)
        .bind(before)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let rows = sqlx::query(
            "SELECT id, ingredient_id, kind, quantity, previous_quantity, new_quantity,
                    order_item_id, notes, actor, created_at
             FROM inventory_transactions
             WHERE ingredient_id = $1
               AND ($2::timestamptz IS NULL OR created_at > $2)
               AND ($3::timestamptz IS NULL OR created_at < $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(*ingredient_id.as_uuid())
        .bind(after)
        .bind(before)
        .bind(query.pagination.limit as i64)
        .bind(query.pagination.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let transactions: Vec<InventoryTransaction> =
            rows.iter().map(row_to_transaction).collect::<LedgerResult<_>>()?;
        let has_more =
            (query.pagination.offset as u64 + transactions.len() as u64) < total as u64;

        Ok(HistoryPage {
            transactions,
            total: total as u64,
            pagination: query.pagination,
            has_more,
        })
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> LedgerResult<F::Output> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| LedgerError::persistence("no tokio runtime available"))?;
        Ok(handle.block_on(fut))
    }
}

/// Conditional balance update + ledger insert, inside the caller's
/// transaction. Zero affected rows means the plan's snapshot went stale.
async fn apply_plan(
    tx: &mut Transaction<'_, Postgres>,
    plan: &TransactionPlan,
) -> LedgerResult<InventoryTransaction> {
    let result = sqlx::query(
        "UPDATE ingredients
         SET stock_quantity = $2,
             version = version + 1,
             cost_per_unit = COALESCE($3, cost_per_unit)
         WHERE id = $1 AND version = $4",
    )
    .bind(*plan.ingredient_id.as_uuid())
    .bind(plan.new_quantity)
    .bind(plan.new_cost_per_unit)
    .bind(plan.expected_version as i64)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::conflict(format!(
            "ingredient {} moved past version {}",
            plan.ingredient_id, plan.expected_version
        )));
    }

    let entry = InventoryTransaction {
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
    };

    sqlx::query(
        "INSERT INTO inventory_transactions
           (id, ingredient_id, kind, quantity, previous_quantity, new_quantity,
            order_item_id, notes, actor, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(*entry.id.as_uuid())
    .bind(*entry.ingredient_id.as_uuid())
    .bind(transaction_type_str(entry.kind))
    .bind(entry.quantity)
    .bind(entry.previous_quantity)
    .bind(entry.new_quantity)
    .bind(entry.order_item_id.map(|id| *id.as_uuid()))
    .bind(entry.notes.as_deref())
    .bind(&entry.actor)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;

    Ok(entry)
}

impl InventoryStore for PostgresInventoryStore {
    fn insert_unit(&self, unit: MeasurementUnit) -> LedgerResult<()> {
        self.block_on(self.insert_unit_async(unit))?
    }

    fn unit(&self, id: UnitId) -> LedgerResult<MeasurementUnit> {
        self.block_on(self.unit_async(id))?
    }

    fn list_units(&self) -> LedgerResult<Vec<MeasurementUnit>> {
        self.block_on(self.list_units_async())?
    }

    fn insert_ingredient(&self, ingredient: Ingredient) -> LedgerResult<()> {
        self.block_on(self.insert_ingredient_async(ingredient))?
    }

    fn ingredient(&self, id: IngredientId) -> LedgerResult<Ingredient> {
        self.block_on(self.ingredient_async(id))?
    }

    fn list_ingredients(&self) -> LedgerResult<Vec<Ingredient>> {
        self.block_on(self.list_ingredients_async())?
    }

    fn set_ingredient_cost(&self, id: IngredientId, cost_per_unit: Decimal) -> LedgerResult<()> {
        self.block_on(self.set_ingredient_cost_async(id, cost_per_unit))?
    }

    fn insert_recipe(&self, recipe: Recipe) -> LedgerResult<()> {
        self.block_on(self.insert_recipe_async(recipe))?
    }

    fn recipe(&self, id: RecipeId) -> LedgerResult<Recipe> {
        self.block_on(self.recipe_async(id))?
    }

    fn recipe_for_food_item(&self, food_item_id: FoodItemId) -> LedgerResult<Recipe> {
        self.block_on(self.recipe_for_food_item_async(food_item_id))?
    }

    fn commit_transaction(&self, plan: TransactionPlan) -> LedgerResult<InventoryTransaction> {
        self.block_on(self.commit_transaction_async(plan))?
    }

    fn commit_consumption(
        &self,
        order_item_id: OrderItemId,
        plans: Vec<TransactionPlan>,
    ) -> LedgerResult<ConsumptionCommit> {
        self.block_on(self.commit_consumption_async(order_item_id, plans))?
    }

    fn consumption_for_order_item(
        &self,
        order_item_id: OrderItemId,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        self.block_on(self.consumption_for_order_item_async(order_item_id))?
    }

    fn history(
        &self,
        ingredient_id: IngredientId,
        query: &HistoryQuery,
    ) -> LedgerResult<HistoryPage> {
        self.block_on(self.history_async(ingredient_id, query))?
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS measurement_units (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        abbreviation TEXT NOT NULL,
        unit_type TEXT NOT NULL,
        factor NUMERIC NOT NULL CHECK (factor > 0)
    )",
    "CREATE TABLE IF NOT EXISTS ingredients (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        unit_id UUID NOT NULL REFERENCES measurement_units(id),
        stock_quantity NUMERIC NOT NULL,
        reorder_level NUMERIC NOT NULL,
        cost_per_unit NUMERIC NOT NULL,
        version BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS recipes (
        id UUID PRIMARY KEY,
        food_item_id UUID NOT NULL UNIQUE,
        serves INTEGER NOT NULL CHECK (serves > 0)
    )",
    "CREATE TABLE IF NOT EXISTS recipe_ingredients (
        recipe_id UUID NOT NULL REFERENCES recipes(id),
        position INTEGER NOT NULL,
        ingredient_id UUID NOT NULL REFERENCES ingredients(id),
        quantity NUMERIC NOT NULL CHECK (quantity > 0),
        unit_id UUID NOT NULL REFERENCES measurement_units(id),
        PRIMARY KEY (recipe_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS inventory_transactions (
        id UUID PRIMARY KEY,
        ingredient_id UUID NOT NULL REFERENCES ingredients(id),
        kind TEXT NOT NULL,
        quantity NUMERIC NOT NULL,
        previous_quantity NUMERIC NOT NULL,
        new_quantity NUMERIC NOT NULL,
        order_item_id UUID,
        notes TEXT,
        actor TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        CHECK (new_quantity - previous_quantity = quantity)
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS inventory_transactions_order_item
     ON inventory_transactions (order_item_id, ingredient_id)
     WHERE order_item_id IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS inventory_transactions_history
     ON inventory_transactions (ingredient_id, created_at DESC)",
];

fn unit_type_str(t: UnitType) -> &'static str {
    match t {
        UnitType::Weight => "weight",
        UnitType::Volume => "volume",
        UnitType::Quantity => "quantity",
        UnitType::Length => "length",
    }
}

fn parse_unit_type(s: &str) -> LedgerResult<UnitType> {
    match s {
        "weight" => Ok(UnitType::Weight),
        "volume" => Ok(UnitType::Volume),
        "quantity" => Ok(UnitType::Quantity),
        "length" => Ok(UnitType::Length),
        other => Err(LedgerError::persistence(format!(
            "unrecognized unit type in storage: {other}"
        ))),
    }
}

fn transaction_type_str(t: TransactionType) -> &'static str {
    match t {
        TransactionType::Purchase => "purchase",
        TransactionType::Consumption => "consumption",
        TransactionType::Waste => "waste",
        TransactionType::Adjustment => "adjustment",
    }
}

fn parse_transaction_type(s: &str) -> LedgerResult<TransactionType> {
    match s {
        "purchase" => Ok(TransactionType::Purchase),
        "consumption" => Ok(TransactionType::Consumption),
        "waste" => Ok(TransactionType::Waste),
        "adjustment" => Ok(TransactionType::Adjustment),
        other => Err(LedgerError::persistence(format!(
            "unrecognized transaction type in storage: {other}"
        ))),
    }
}

fn row_to_unit(row: &PgRow) -> LedgerResult<MeasurementUnit> {
    let id: Uuid = row.try_get("id").map_err(map_sqlx)?;
    let unit_type: String = row.try_get("unit_type").map_err(map_sqlx)?;
    Ok(MeasurementUnit {
        id: UnitId::from_uuid(id),
        name: row.try_get("name").map_err(map_sqlx)?,
        abbreviation: row.try_get("abbreviation").map_err(map_sqlx)?,
        unit_type: parse_unit_type(&unit_type)?,
        factor: row.try_get("factor").map_err(map_sqlx)?,
    })
}

fn row_to_ingredient(row: &PgRow) -> LedgerResult<Ingredient> {
    let id: Uuid = row.try_get("id").map_err(map_sqlx)?;
    let unit_id: Uuid = row.try_get("unit_id").map_err(map_sqlx)?;
    let version: i64 = row.try_get("version").map_err(map_sqlx)?;
    Ok(Ingredient {
        id: IngredientId::from_uuid(id),
        name: row.try_get("name").map_err(map_sqlx)?,
        category: row.try_get("category").map_err(map_sqlx)?,
        unit_id: UnitId::from_uuid(unit_id),
        stock_quantity: row.try_get("stock_quantity").map_err(map_sqlx)?,
        reorder_level: row.try_get("reorder_level").map_err(map_sqlx)?,
        cost_per_unit: row.try_get("cost_per_unit").map_err(map_sqlx)?,
        version: version.max(0) as u64,
    })
}

fn row_to_transaction(row: &PgRow) -> LedgerResult<InventoryTransaction> {
    let id: Uuid = row.try_get("id").map_err(map_sqlx)?;
    let ingredient_id: Uuid = row.try_get("ingredient_id").map_err(map_sqlx)?;
    let kind: String = row.try_get("kind").map_err(map_sqlx)?;
    let order_item_id: Option<Uuid> = row.try_get("order_item_id").map_err(map_sqlx)?;
    Ok(InventoryTransaction {
        id: TransactionId::from_uuid(id),
        ingredient_id: IngredientId::from_uuid(ingredient_id),
        kind: parse_transaction_type(&kind)?,
        quantity: row.try_get("quantity").map_err(map_sqlx)?,
        previous_quantity: row.try_get("previous_quantity").map_err(map_sqlx)?,
        new_quantity: row.try_get("new_quantity").map_err(map_sqlx)?,
        order_item_id: order_item_id.map(OrderItemId::from_uuid),
        notes: row.try_get("notes").map_err(map_sqlx)?,
        actor: row.try_get("actor").map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn map_sqlx(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            // Unique violation (idempotency/version race) and serialization
            // failure are both safe to retry.
            if code == "23505" || code == "40001" {
                return LedgerError::conflict(db.message().to_string());
            }
        }
    }
    LedgerError::persistence(err.to_string())
}
