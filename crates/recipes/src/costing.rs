use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{canonical, IngredientId, LedgerError, LedgerResult};
use larder_inventory::Ingredient;
use larder_units::UnitRegistry;

use crate::recipe::Recipe;

/// Read-only access to ingredient state.
///
/// Implemented by the backing store in `larder-infra` and by plain maps in
/// tests; costing never mutates anything through it.
pub trait IngredientLookup {
    fn ingredient(&self, id: IngredientId) -> Option<Ingredient>;
}

impl IngredientLookup for std::collections::HashMap<IngredientId, Ingredient> {
    fn ingredient(&self, id: IngredientId) -> Option<Ingredient> {
        self.get(&id).cloned()
    }
}

/// Derived cost of a recipe at current ingredient prices.
///
/// Recomputed on demand; there is no push mechanism, so a cached value can
/// lag an ingredient cost change until the next read (eventual, not
/// instantaneous).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCost {
    pub total_cost: Decimal,
    pub cost_per_serving: Decimal,
}

/// Cost a recipe from its ingredient lines.
///
/// Each line's quantity is converted into the ingredient's canonical unit
/// and multiplied by the ingredient's cost per canonical unit, summed across
/// lines; per-serving divides by `serves` (which `Recipe::new` guarantees is
/// positive, but a hand-built recipe with `serves == 0` is still rejected
/// here rather than dividing by zero).
pub fn compute_recipe_cost(
    recipe: &Recipe,
    registry: &UnitRegistry,
    ingredients: &impl IngredientLookup,
) -> LedgerResult<RecipeCost> {
    if recipe.serves == 0 {
        return Err(LedgerError::validation("recipe serves must be positive"));
    }

    let mut total_cost = Decimal::ZERO;
    for line in &recipe.ingredients {
        let ingredient = ingredients
            .ingredient(line.ingredient_id)
            .ok_or_else(|| LedgerError::unknown("ingredient", line.ingredient_id))?;

        let required = registry.convert(line.quantity, line.unit_id, ingredient.unit_id)?;
        total_cost += required * ingredient.cost_per_unit;
    }

    let total_cost = canonical(total_cost);
    let cost_per_serving = canonical(total_cost / Decimal::from(recipe.serves));

    Ok(RecipeCost {
        total_cost,
        cost_per_serving,
    })
}
