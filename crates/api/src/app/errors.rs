use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use larder_core::LedgerError;

/// Map a ledger error to a structured JSON response.
///
/// 409 and 503 are the retryable ones; the client decides final user-facing
/// messaging.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match &err {
        LedgerError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
        }
        LedgerError::UnknownEntity { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        LedgerError::IncompatibleUnitType { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "incompatible_unit_type",
            err.to_string(),
        ),
        LedgerError::InsufficientStock { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_stock",
            err.to_string(),
        ),
        LedgerError::ConcurrencyConflict(msg) => {
            json_error(StatusCode::CONFLICT, "conflict", msg.clone())
        }
        LedgerError::Persistence(msg) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "persistence_error",
            msg.clone(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &'static str) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "invalid_id",
        format!("invalid {what} id"),
    )
}
