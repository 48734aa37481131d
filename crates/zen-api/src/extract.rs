use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::validation::Validate;

/// JSON body that is deserialized and then validated. Any rejection is
/// reported in the API's own error shape.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!("Rejected request body: {}", rejection.body_text());
            ApiError::validation("Dados inválidos")
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl<T> ValidJson<T>
where
    T: DeserializeOwned + Validate,
{
    /// Same checks as the extractor, for handlers that must authorize the
    /// caller before looking at the body.
    pub fn from_bytes(body: &[u8]) -> Result<Self, ApiError> {
        let Json(value) = Json::<T>::from_bytes(body).map_err(|rejection| {
            debug!("Rejected request body: {}", rejection.body_text());
            ApiError::validation("Dados inválidos")
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// A single `{id}` path segment that must be a UUID.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid_id())?;
        raw.parse::<Uuid>().map(PathId).map_err(|_| invalid_id())
    }
}

fn invalid_id() -> ApiError {
    ApiError::validation("Identificador inválido")
}
