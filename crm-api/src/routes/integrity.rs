//! Comment link integrity routes

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::ApiResult,
    services::{check_comment_links, repair_orphaned_comments, IntegrityReport, RepairReport},
    state::{AppState, DynStore},
};

/// GET /integrity/comments - Report lead/comment link mismatches
#[utoipa::path(
    get,
    path = "/integrity/comments",
    tag = "Integrity",
    responses(
        (status = 200, description = "Link report", body = IntegrityReport),
    ),
)]
pub async fn comment_report(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(check_comment_links(store.as_ref()).await?))
}

/// POST /integrity/comments/repair - Re-link orphaned comments
#[utoipa::path(
    post,
    path = "/integrity/comments/repair",
    tag = "Integrity",
    responses(
        (status = 200, description = "Number of comments re-linked", body = RepairReport),
    ),
)]
pub async fn repair_comments(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(repair_orphaned_comments(store.as_ref()).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/integrity/comments", get(comment_report))
        .route("/integrity/comments/repair", post(repair_comments))
}
