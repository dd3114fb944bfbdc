use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use larder_core::RecipeId;
use larder_recipes::RecipeIngredient;

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_recipe))
        .route("/:id", get(get_recipe))
        .route("/:id/cost", get(recipe_cost))
}

fn parse_id(raw: &str) -> Result<RecipeId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("recipe"))
}

pub async fn create_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRecipeRequest>,
) -> axum::response::Response {
    let food_item_id = match body.food_item_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::invalid_id("food item"),
    };

    let mut lines = Vec::with_capacity(body.ingredients.len());
    for line in body.ingredients {
        let ingredient_id = match line.ingredient_id.parse() {
            Ok(id) => id,
            Err(_) => return errors::invalid_id("ingredient"),
        };
        let unit_id = match line.unit_id.parse() {
            Ok(id) => id,
            Err(_) => return errors::invalid_id("unit"),
        };
        lines.push(RecipeIngredient {
            ingredient_id,
            quantity: line.quantity,
            unit_id,
        });
    }

    match services
        .ledger
        .create_recipe(food_item_id, body.serves, lines)
    {
        Ok(recipe) => (StatusCode::CREATED, Json(recipe)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.ledger.recipe(id) {
        Ok(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn recipe_cost(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.ledger.recipe_cost(id) {
        Ok(cost) => (StatusCode::OK, Json(cost)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
