//! Axum extractor for validated request bodies

use super::Normalize;
use crate::core::error::ApiError;
use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Axum extractor that deserializes, normalizes and validates a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_category(
///     ValidatedJson(payload): ValidatedJson<CreateCategory>,
/// ) -> Result<impl IntoResponse, ApiError> {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Normalize + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut payload): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Corps de requête invalide: {}", e.body_text())))?;

        payload.normalize();
        payload
            .validate()
            .map_err(|errors| ApiError::validation(flatten_errors(&errors)))?;

        Ok(ValidatedJson(payload))
    }
}

/// Flatten nested validation errors into one message
///
/// Messages are ordered by field path and joined with `", "`.
pub fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut collected: Vec<(String, String)> = Vec::new();
    collect(errors, "", &mut collected);
    collected.sort();
    collected.dedup();

    collected
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Le champ '{}' est invalide", path));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
