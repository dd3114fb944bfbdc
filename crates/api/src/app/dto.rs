use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::display;
use larder_inventory::{AdjustmentDirection, Ingredient};
use larder_units::UnitType;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterUnitRequest {
    pub name: String,
    pub abbreviation: String,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub factor: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub category: String,
    pub unit_id: String,
    #[serde(default)]
    pub opening_stock: Decimal,
    #[serde(default)]
    pub reorder_level: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub direction: AdjustmentDirection,
    pub quantity: Decimal,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordWasteRequest {
    pub quantity: Decimal,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCostRequest {
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecipeLineRequest {
    pub ingredient_id: String,
    pub quantity: Decimal,
    pub unit_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub food_item_id: String,
    pub serves: u32,
    pub ingredients: Vec<RecipeLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeOrderItemRequest {
    pub order_item_id: String,
    pub food_item_id: String,
    pub quantity: u32,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Ingredient projection with display-rounded numbers.
#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_id: String,
    pub stock_quantity: Decimal,
    pub reorder_level: Decimal,
    pub cost_per_unit: Decimal,
    pub needs_reorder: bool,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        let needs_reorder = ingredient.needs_reorder();
        Self {
            id: ingredient.id.to_string(),
            name: ingredient.name,
            category: ingredient.category,
            unit_id: ingredient.unit_id.to_string(),
            stock_quantity: display(ingredient.stock_quantity),
            reorder_level: display(ingredient.reorder_level),
            cost_per_unit: display(ingredient.cost_per_unit),
            needs_reorder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn adjust_request_parses_lowercase_direction() {
        let req: AdjustStockRequest = serde_json::from_str(
            r#"{"direction":"remove","quantity":"2.5","actor":"admin"}"#,
        )
        .unwrap();
        assert_eq!(req.direction, AdjustmentDirection::Remove);
        assert_eq!(req.quantity, dec!(2.5));
        assert!(req.note.is_none());
    }

    #[test]
    fn unit_request_parses_lowercase_type() {
        let req: RegisterUnitRequest = serde_json::from_str(
            r#"{"name":"gram","abbreviation":"g","type":"weight","factor":"0.001"}"#,
        )
        .unwrap();
        assert_eq!(req.unit_type, UnitType::Weight);
    }
}
