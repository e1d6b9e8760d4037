//! services/api/src/web/extract.rs
//!
//! Request-body helpers shared by the handlers. Every endpoint deserializes
//! into a typed struct whose required fields are `Option`s, then checks them
//! with [`required`] so missing fields all surface as the same 400 error.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::ApiError;

/// Unwraps a JSON body, turning any rejection into a validation error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::Validation(rejection.body_text()))
        }
    }
}

/// Returns the field's value or a validation error carrying `message`.
pub fn required<T>(field: Option<T>, message: &str) -> Result<T, ApiError> {
    field.ok_or_else(|| ApiError::Validation(message.to_string()))
}

/// Like [`required`], but an empty string counts as missing.
pub fn required_non_empty(field: Option<String>, message: &str) -> Result<String, ApiError> {
    required(field.filter(|value| !value.is_empty()), message)
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
/// Use together with `#[serde(default)]`.
pub fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
