// Request body and path helpers shared by the handlers

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Unwrap a JSON body that must be an object
pub fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = body.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::invalid_json("Request body must be a JSON object")),
    }
}

/// Parse an id from a path or body, naming `field` in the error
pub fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("The `{}` is not valid", field)))
}

/// Optional query-string id: absent or empty means "no filter"
pub fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<Uuid>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => parse_id(raw, field).map(Some),
    }
}
