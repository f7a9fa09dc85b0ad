//! Helpers shared by the catalog modules.

pub mod fields;
pub mod pagination;
pub mod search;

use axum::{extract::rejection::JsonRejection, Json};
use libris_http::AppError;

/// Parse a path id. Anything that is not a positive integer cannot name a
/// record, so it is a 404 rather than a 400.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found("Not found."))
}

/// Unwrap a JSON body, turning axum's rejection into the shared error envelope.
pub fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
