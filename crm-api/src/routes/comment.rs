//! Comment REST API Routes

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use crm_core::Comment;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId},
    services::{attach_comment, lead_comments},
    state::{AppState, DynStore},
    types::{CreateCommentRequest, ORPHANED_COMMENT_HEADER},
};

/// POST /leads/{id}/comments - Add a comment to a lead
///
/// The comment is created even when the lead does not exist; in that case
/// the response carries `x-crm-orphaned-comment: true`.
#[utoipa::path(
    post,
    path = "/leads/{id}/comments",
    tag = "Comments",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment,
            headers(("x-crm-orphaned-comment" = String, description = "Present when the lead was missing"))),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
)]
pub async fn create_comment(
    State(store): State<DynStore>,
    PathId(lead_id): PathId,
    JsonBody(req): JsonBody<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let attached =
        attach_comment(store.as_ref(), lead_id, req.comment_text, req.author).await?;

    let mut response = (StatusCode::CREATED, Json(attached.comment)).into_response();
    if !attached.linked {
        response.headers_mut().insert(
            HeaderName::from_static(ORPHANED_COMMENT_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    Ok(response)
}

/// GET /leads/{id}/comments - List a lead's comments
#[utoipa::path(
    get,
    path = "/leads/{id}/comments",
    tag = "Comments",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Comments in attachment order", body = Vec<Comment>),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn list_comments(
    State(store): State<DynStore>,
    PathId(lead_id): PathId,
) -> ApiResult<impl IntoResponse> {
    let comments = lead_comments(store.as_ref(), lead_id).await?;
    Ok(Json(comments))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route(
        "/leads/:id/comments",
        get(list_comments).post(create_comment),
    )
}
