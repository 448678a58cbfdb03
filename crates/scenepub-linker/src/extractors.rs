//! # Extractors & Validation
//!
//! JSON bodies are extracted as `Result<Json<T>, JsonRejection>` so that
//! every parse failure becomes an [`ApiError::BadRequest`] with our error
//! body instead of axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Request types that check rules serde cannot express.
pub trait Validate {
    /// Validated form of the request.
    type Output;

    /// Check the request, producing its validated form.
    fn validate(self) -> Result<Self::Output, ApiError>;
}

/// Extract a JSON body, mapping deserialization errors to `400`.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| ApiError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Output, ApiError> {
    extract_json(result)?.validate()
}
