use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::{Validate, ValidationErrors};

use crate::schemas::{bad_request, ApiError};

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed bodies and failed validation both become a 400 with the
/// usual `ErrorResponse` envelope instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                warn!("Rejected JSON body: {}", rejection.body_text());
                bad_request("INVALID_BODY", rejection.body_text())
            })?;

        value.validate().map_err(|errors| {
            warn!("Request failed validation: {}", errors);
            bad_request("VALIDATION_ERROR", describe(&errors))
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Flattens field errors into `field: message` pairs.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid value ({})", field, e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
