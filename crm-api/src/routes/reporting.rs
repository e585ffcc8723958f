//! Reporting REST API Routes

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use crm_core::{ConversionReport, PipelineSummary, StatusCount};

use crate::{
    error::ApiResult,
    services::reporting,
    state::{AppState, DynStore},
};

/// GET /reporting/pipeline - Lead count per status
#[utoipa::path(
    get,
    path = "/reporting/pipeline",
    tag = "Reporting",
    responses(
        (status = 200, description = "One entry per distinct status, unordered", body = Vec<StatusCount>),
    ),
)]
pub async fn pipeline(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(reporting::pipeline(store.as_ref()).await?))
}

/// GET /reporting/conversions - Closed over new, as a percentage
#[utoipa::path(
    get,
    path = "/reporting/conversions",
    tag = "Reporting",
    responses(
        (status = 200, description = "Conversion rate", body = ConversionReport),
    ),
)]
pub async fn conversions(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(reporting::conversions(store.as_ref()).await?))
}

/// GET /reporting/summary - Total and closed lead counts
#[utoipa::path(
    get,
    path = "/reporting/summary",
    tag = "Reporting",
    responses(
        (status = 200, description = "Pipeline totals", body = PipelineSummary),
    ),
)]
pub async fn summary(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(reporting::summary(store.as_ref()).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/reporting/pipeline", get(pipeline))
        .route("/reporting/conversions", get(conversions))
        .route("/reporting/summary", get(summary))
}
