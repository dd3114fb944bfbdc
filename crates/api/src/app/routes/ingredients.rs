use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use larder_core::IngredientId;
use larder_infra::{HistoryQuery, NewIngredient, Pagination, TimeRange};

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_ingredient).get(list_ingredients))
        .route("/:id", get(get_ingredient))
        .route("/:id/adjust", post(adjust_stock))
        .route("/:id/waste", post(record_waste))
        .route("/:id/purchase", post(record_purchase))
        .route("/:id/cost", put(set_cost))
        .route("/:id/history", get(history))
}

fn parse_id(raw: &str) -> Result<IngredientId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("ingredient"))
}

pub async fn create_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateIngredientRequest>,
) -> axum::response::Response {
    let unit_id = match body.unit_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::invalid_id("unit"),
    };
    let new = NewIngredient {
        name: body.name,
        category: body.category,
        unit_id,
        opening_stock: body.opening_stock,
        reorder_level: body.reorder_level,
        cost_per_unit: body.cost_per_unit,
    };
    match services.ledger.create_ingredient(new) {
        Ok(ingredient) => (
            StatusCode::CREATED,
            Json(dto::IngredientResponse::from(ingredient)),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_ingredients(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_ingredients() {
        Ok(ingredients) => {
            let body: Vec<dto::IngredientResponse> =
                ingredients.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.ledger.ingredient(id) {
        Ok(ingredient) => (
            StatusCode::OK,
            Json(dto::IngredientResponse::from(ingredient)),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .ledger
        .adjust_stock(id, body.direction, body.quantity, body.note, &body.actor)
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn record_waste(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordWasteRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .ledger
        .record_waste(id, body.quantity, body.note, &body.actor)
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn record_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordPurchaseRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .ledger
        .record_purchase(id, body.quantity, body.unit_cost, body.note, &body.actor)
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn set_cost(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetCostRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.ledger.set_ingredient_cost(id, body.cost_per_unit) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::HistoryParams>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let query = HistoryQuery {
        range: TimeRange {
            after: params.after,
            before: params.before,
        },
        pagination: Pagination::new(params.limit, params.offset),
    };
    match services.ledger.history(id, &query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
