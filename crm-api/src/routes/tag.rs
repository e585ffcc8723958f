//! Tag REST API Routes
//!
//! The tag catalog and lead tagging. Lead tags are stored as plain names
//! and are not checked against the catalog.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use crm_core::{Lead, NewTag, Tag};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId},
    state::{AppState, DynStore},
    types::AddTagsRequest,
};

/// POST /tags - Create a tag
#[utoipa::path(
    post,
    path = "/tags",
    tag = "Tags",
    request_body = NewTag,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Name missing", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError),
    ),
)]
pub async fn create_tag(
    State(store): State<DynStore>,
    JsonBody(req): JsonBody<NewTag>,
) -> ApiResult<impl IntoResponse> {
    let tag = store.tag_insert(req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /tags - List tags
#[utoipa::path(
    get,
    path = "/tags",
    tag = "Tags",
    responses(
        (status = 200, description = "All tags", body = Vec<Tag>),
    ),
)]
pub async fn list_tags(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.tag_list().await?))
}

/// PATCH /leads/{id}/tags - Add tags to a lead
#[utoipa::path(
    patch,
    path = "/leads/{id}/tags",
    tag = "Tags",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    request_body = AddTagsRequest,
    responses(
        (status = 200, description = "Lead with the merged tag set", body = Lead),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn add_lead_tags(
    State(store): State<DynStore>,
    PathId(lead_id): PathId,
    JsonBody(req): JsonBody<AddTagsRequest>,
) -> ApiResult<impl IntoResponse> {
    let lead = store.lead_add_tags(lead_id, req.tags).await?;
    Ok(Json(lead))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/leads/:id/tags", patch(add_lead_tags))
}
