use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{canonical, FoodItemId, IngredientId, LedgerError, LedgerResult, OrderItemId};
use larder_units::UnitRegistry;

use crate::costing::IngredientLookup;
use crate::recipe::Recipe;

/// An order line item, owned by the order subsystem.
///
/// Its id doubles as the idempotency key: however often the order subsystem
/// retries, at most one consumption set exists per `OrderItemId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub food_item_id: FoodItemId,
    /// Servings ordered.
    pub quantity: u32,
}

/// Canonical-unit requirement for one ingredient of an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLine {
    pub ingredient_id: IngredientId,
    /// Positive requirement in the ingredient's canonical unit.
    pub quantity: Decimal,
}

/// Translate an order line into per-ingredient canonical requirements.
///
/// `required = recipe line quantity x servings ordered`, converted into each
/// ingredient's canonical unit. Requirements for the same ingredient are
/// merged so the ledger sees one consumption entry per ingredient. This is
/// pure planning; whether stock suffices is decided at commit time, for all
/// lines together or not at all.
pub fn plan_order_consumption(
    order_item: &OrderItem,
    recipe: &Recipe,
    registry: &UnitRegistry,
    ingredients: &impl IngredientLookup,
) -> LedgerResult<Vec<ConsumptionLine>> {
    if order_item.quantity == 0 {
        return Err(LedgerError::validation("order quantity must be positive"));
    }
    if recipe.food_item_id != order_item.food_item_id {
        return Err(LedgerError::validation(format!(
            "recipe {} does not belong to food item {}",
            recipe.id, order_item.food_item_id
        )));
    }

    let servings = Decimal::from(order_item.quantity);
    let mut lines: Vec<ConsumptionLine> = Vec::with_capacity(recipe.ingredients.len());

    for line in &recipe.ingredients {
        let ingredient = ingredients
            .ingredient(line.ingredient_id)
            .ok_or_else(|| LedgerError::unknown("ingredient", line.ingredient_id))?;

        let per_serving = registry.convert(line.quantity, line.unit_id, ingredient.unit_id)?;
        let required = canonical(per_serving * servings);

        match lines.iter_mut().find(|l| l.ingredient_id == ingredient.id) {
            Some(existing) => existing.quantity = canonical(existing.quantity + required),
            None => lines.push(ConsumptionLine {
                ingredient_id: ingredient.id,
                quantity: required,
            }),
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use larder_core::{RecipeId, UnitId};
    use larder_inventory::Ingredient;
    use larder_units::{MeasurementUnit, UnitType};
    use rust_decimal_macros::dec;

    use crate::recipe::RecipeIngredient;

    struct Fixture {
        registry: UnitRegistry,
        ingredients: HashMap<IngredientId, Ingredient>,
        kg: UnitId,
        g: UnitId,
        beef: IngredientId,
    }

    fn fixture() -> Fixture {
        let mut registry = UnitRegistry::new();
        let kg = MeasurementUnit::new(UnitId::new(), "kilogram", "kg", UnitType::Weight, dec!(1))
            .unwrap();
        let g = MeasurementUnit::new(UnitId::new(), "gram", "g", UnitType::Weight, dec!(0.001))
            .unwrap();
        let (kg_id, g_id) = (kg.id, g.id);
        registry.register(kg);
        registry.register(g);

        let beef = Ingredient::new(
            IngredientId::new(),
            "Beef",
            "Meat",
            kg_id,
            dec!(15),
            dec!(2),
            dec!(8.00),
        )
        .unwrap();
        let beef_id = beef.id;

        Fixture {
            registry,
            ingredients: HashMap::from([(beef_id, beef)]),
            kg: kg_id,
            g: g_id,
            beef: beef_id,
        }
    }

    fn recipe_for(f: &Fixture, food_item_id: FoodItemId, qty: Decimal, unit: UnitId) -> Recipe {
        Recipe::new(
            RecipeId::new(),
            food_item_id,
            1,
            vec![RecipeIngredient {
                ingredient_id: f.beef,
                quantity: qty,
                unit_id: unit,
            }],
        )
        .unwrap()
    }

    #[test]
    fn three_servings_of_point_two_kg_need_point_six() {
        let f = fixture();
        let food = FoodItemId::new();
        let recipe = recipe_for(&f, food, dec!(0.2), f.kg);
        let order = OrderItem {
            id: OrderItemId::new(),
            food_item_id: food,
            quantity: 3,
        };

        let lines = plan_order_consumption(&order, &recipe, &f.registry, &f.ingredients).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, dec!(0.6));
    }

    #[test]
    fn gram_lines_convert_into_canonical_kilograms() {
        let f = fixture();
        let food = FoodItemId::new();
        // 500 g per serving, 2 servings -> 1.0 kg.
        let recipe = recipe_for(&f, food, dec!(500), f.g);
        let order = OrderItem {
            id: OrderItemId::new(),
            food_item_id: food,
            quantity: 2,
        };

        let lines = plan_order_consumption(&order, &recipe, &f.registry, &f.ingredients).unwrap();
        assert_eq!(lines[0].quantity, dec!(1.0));
    }

    #[test]
    fn duplicate_ingredient_lines_are_merged() {
        let f = fixture();
        let food = FoodItemId::new();
        let recipe = Recipe::new(
            RecipeId::new(),
            food,
            1,
            vec![
                RecipeIngredient {
                    ingredient_id: f.beef,
                    quantity: dec!(0.1),
                    unit_id: f.kg,
                },
                RecipeIngredient {
                    ingredient_id: f.beef,
                    quantity: dec!(200),
                    unit_id: f.g,
                },
            ],
        )
        .unwrap();
        let order = OrderItem {
            id: OrderItemId::new(),
            food_item_id: food,
            quantity: 2,
        };

        let lines = plan_order_consumption(&order, &recipe, &f.registry, &f.ingredients).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, dec!(0.6));
    }

    #[test]
    fn zero_quantity_order_is_rejected() {
        let f = fixture();
        let food = FoodItemId::new();
        let recipe = recipe_for(&f, food, dec!(0.2), f.kg);
        let order = OrderItem {
            id: OrderItemId::new(),
            food_item_id: food,
            quantity: 0,
        };

        let err =
            plan_order_consumption(&order, &recipe, &f.registry, &f.ingredients).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn mismatched_food_item_is_rejected() {
        let f = fixture();
        let recipe = recipe_for(&f, FoodItemId::new(), dec!(0.2), f.kg);
        let order = OrderItem {
            id: OrderItemId::new(),
            food_item_id: FoodItemId::new(),
            quantity: 1,
        };

        let err =
            plan_order_consumption(&order, &recipe, &f.registry, &f.ingredients).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
