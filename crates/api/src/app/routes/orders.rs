use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use larder_core::OrderItemId;
use larder_infra::ConsumptionCommit;
use larder_recipes::OrderItem;

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/consume", post(consume_order_item))
        .route("/:order_item_id/consumption", get(order_item_consumption))
}

/// Deduct the recipe quantities behind one order line.
///
/// Safe to retry: a repeated `order_item_id` returns the entries written by
/// the first call with 200 instead of 201. The status comes from the commit
/// outcome itself, so concurrent first-time requests get exactly one 201.
pub async fn consume_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ConsumeOrderItemRequest>,
) -> axum::response::Response {
    let order_item_id: OrderItemId = match body.order_item_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::invalid_id("order item"),
    };
    let food_item_id = match body.food_item_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::invalid_id("food item"),
    };

    let order_item = OrderItem {
        id: order_item_id,
        food_item_id,
        quantity: body.quantity,
    };
    match services
        .ledger
        .apply_order_item_consumption(&order_item, &body.actor)
    {
        Ok(ConsumptionCommit::Applied(entries)) => {
            (StatusCode::CREATED, Json(entries)).into_response()
        }
        Ok(ConsumptionCommit::AlreadyApplied(entries)) => {
            (StatusCode::OK, Json(entries)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn order_item_consumption(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_item_id): Path<String>,
) -> axum::response::Response {
    let order_item_id: OrderItemId = match order_item_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::invalid_id("order item"),
    };
    match services.ledger.consumption_for_order_item(order_item_id) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
