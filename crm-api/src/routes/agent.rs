//! Agent REST API Routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use crm_core::{Agent, NewAgent};

use crate::{
    error::{ApiError, ApiResult},
    extractors::JsonBody,
    state::{AppState, DynStore},
};

/// POST /agents - Register an agent
#[utoipa::path(
    post,
    path = "/agents",
    tag = "Agents",
    request_body = NewAgent,
    responses(
        (status = 201, description = "Agent created", body = Agent),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
)]
pub async fn create_agent(
    State(store): State<DynStore>,
    JsonBody(req): JsonBody<NewAgent>,
) -> ApiResult<impl IntoResponse> {
    let agent = store.agent_insert(req).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// GET /agents - List agents
#[utoipa::path(
    get,
    path = "/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "All agents", body = Vec<Agent>),
    ),
)]
pub async fn list_agents(State(store): State<DynStore>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.agent_list().await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/agents", get(list_agents).post(create_agent))
}
