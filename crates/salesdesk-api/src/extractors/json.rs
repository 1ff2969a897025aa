//! JSON body extractor that runs `validator` rules and reports failures
//! in the standard error envelope.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use salesdesk_core::error::AppError;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| AppError::validation(describe(&errors)))?;
        Ok(Self(value))
    }
}

/// First message of every failing field, sorted by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            errs.first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
