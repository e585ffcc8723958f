//! Request extractors that reject with `ApiError` instead of axum's
//! plain-text rejections, so every 4xx carries the same JSON body.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use crm_core::EntityId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Single UUID path parameter.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub EntityId);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<EntityId>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::invalid_format("id", "a UUID").with_details(serde_json::json!({
                    "path": parts.uri.path(),
                    "reason": e.body_text(),
                }))
            })?;
        Ok(PathId(id))
    }
}

/// JSON request body; any rejection becomes a 400 `INVALID_INPUT`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Query string; any rejection becomes a 400 `INVALID_INPUT`.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}
