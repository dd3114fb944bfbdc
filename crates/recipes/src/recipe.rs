use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{FoodItemId, IngredientId, LedgerError, LedgerResult, RecipeId, UnitId};

/// One ingredient line of a recipe.
///
/// `unit_id` may differ from the ingredient's canonical unit (a recipe can
/// call for 500 g of an ingredient stocked in kilograms); conversion happens
/// at costing/deduction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
    pub unit_id: UnitId,
}

/// A recipe tied to a menu food item.
///
/// Edited by staff through ordinary CRUD; edits affect only future
/// deductions, never past ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub food_item_id: FoodItemId,
    /// Servings the ingredient quantities yield.
    pub serves: u32,
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn new(
        id: RecipeId,
        food_item_id: FoodItemId,
        serves: u32,
        ingredients: Vec<RecipeIngredient>,
    ) -> LedgerResult<Self> {
        if serves == 0 {
            return Err(LedgerError::validation("recipe must serve at least one"));
        }
        if ingredients.is_empty() {
            return Err(LedgerError::validation("recipe must have ingredients"));
        }
        for line in &ingredients {
            if line.quantity <= Decimal::ZERO {
                return Err(LedgerError::validation(format!(
                    "recipe ingredient {} quantity must be positive",
                    line.ingredient_id
                )));
            }
        }

        Ok(Self {
            id,
            food_item_id,
            serves,
            ingredients,
        })
    }
}
