//! Request and response bodies that are not core entities.

use serde::{Deserialize, Serialize};

use crm_core::{AgentId, LeadFilter};

use crate::error::{ApiError, ApiResult};

/// Response header set when a comment was stored but its lead was missing.
pub const ORPHANED_COMMENT_HEADER: &str = "x-crm-orphaned-comment";

/// Body of `POST /leads/{id}/comments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub comment_text: Option<String>,
    pub author: Option<String>,
}

/// Body of `PATCH /leads/{id}/tags`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct AddTagsRequest {
    pub tags: Vec<String>,
}

/// Body returned by `DELETE /leads/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted() -> Self {
        Self {
            message: "Deleted".to_string(),
        }
    }
}

/// Query string of `GET /leads`. Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListLeadsParams {
    /// Agent id the lead is assigned to
    pub assigned_agent: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub priority: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ListLeadsParams {
    /// Turn query parameters into a store filter.
    pub fn into_filter(self) -> ApiResult<LeadFilter> {
        let assigned_agent = non_empty(self.assigned_agent)
            .map(|raw| {
                raw.parse::<AgentId>()
                    .map_err(|_| ApiError::invalid_format("assignedAgent", "a UUID"))
            })
            .transpose()?;

        Ok(LeadFilter {
            assigned_agent,
            status: non_empty(self.status),
            source: non_empty(self.source),
            priority: non_empty(self.priority),
        })
    }
}
