//! Lead REST API Routes
//!
//! Reads return leads with their agent and comments expanded. Writes
//! return the stored lead with references as ids.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use crm_core::{Lead, LeadUpdate, NewLead, ResolvedLead};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId, QueryParams},
    services::resolver,
    state::{AppState, DynStore},
    types::{DeleteResponse, ListLeadsParams},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /leads - Create a lead
#[utoipa::path(
    post,
    path = "/leads",
    tag = "Leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
)]
pub async fn create_lead(
    State(store): State<DynStore>,
    JsonBody(req): JsonBody<NewLead>,
) -> ApiResult<impl IntoResponse> {
    let lead = store.lead_insert(req).await?;
    tracing::debug!(lead_id = %lead.id, "Lead created");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /leads - List leads, optionally filtered
#[utoipa::path(
    get,
    path = "/leads",
    tag = "Leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "Matching leads", body = Vec<ResolvedLead>),
        (status = 400, description = "Invalid filter", body = ApiError),
    ),
)]
pub async fn list_leads(
    State(store): State<DynStore>,
    QueryParams(params): QueryParams<ListLeadsParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    let leads = store.lead_list(&filter).await?;
    let resolved = resolver::resolve_leads(store.as_ref(), leads).await?;
    Ok(Json(resolved))
}

/// GET /leads/{id} - Get a lead
#[utoipa::path(
    get,
    path = "/leads/{id}",
    tag = "Leads",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Lead details", body = ResolvedLead),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn get_lead(
    State(store): State<DynStore>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let lead = resolver::get_resolved_lead(store.as_ref(), id).await?;
    Ok(Json(lead))
}

/// PATCH /leads/{id} - Update a lead
#[utoipa::path(
    patch,
    path = "/leads/{id}",
    tag = "Leads",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    request_body = LeadUpdate,
    responses(
        (status = 200, description = "Lead updated", body = Lead),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn update_lead(
    State(store): State<DynStore>,
    PathId(id): PathId,
    JsonBody(req): JsonBody<LeadUpdate>,
) -> ApiResult<impl IntoResponse> {
    let lead = store.lead_update(id, req).await?;
    Ok(Json(lead))
}

/// DELETE /leads/{id} - Delete a lead
///
/// Comments that belonged to the lead are left in place.
#[utoipa::path(
    delete,
    path = "/leads/{id}",
    tag = "Leads",
    params(
        ("id" = String, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Lead deleted", body = DeleteResponse),
        (status = 404, description = "Lead not found", body = ApiError),
    ),
)]
pub async fn delete_lead(
    State(store): State<DynStore>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    store.lead_delete(id).await?;
    tracing::debug!(lead_id = %id, "Lead deleted");
    Ok(Json(DeleteResponse::deleted()))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route(
            "/leads/:id",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
}
