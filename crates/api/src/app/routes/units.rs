use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new().route("/", post(register_unit).get(list_units))
}

pub async fn register_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterUnitRequest>,
) -> axum::response::Response {
    match services.ledger.register_unit(
        body.name,
        body.abbreviation,
        body.unit_type,
        body.factor,
    ) {
        Ok(unit) => (StatusCode::CREATED, Json(unit)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_units(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_units() {
        Ok(units) => (StatusCode::OK, Json(units)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
