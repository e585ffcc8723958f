//! Relationship Resolver
//!
//! Expands a lead's `assignedAgent` and `comments` references into full
//! documents. A reference whose target is gone resolves to nothing: the
//! agent becomes `null` and the comment is dropped.

use std::collections::HashMap;

use crm_core::{Agent, Comment, EntityType, Lead, LeadId, ResolvedLead};
use crm_storage::CrmStore;

use crate::error::{ApiError, ApiResult};

/// Resolve a batch of leads with one agent fetch and one comment fetch.
pub async fn resolve_leads(store: &dyn CrmStore, leads: Vec<Lead>) -> ApiResult<Vec<ResolvedLead>> {
    if leads.is_empty() {
        return Ok(Vec::new());
    }

    let mut agent_ids: Vec<_> = leads.iter().filter_map(|l| l.assigned_agent).collect();
    agent_ids.sort_unstable();
    agent_ids.dedup();

    let mut comment_ids: Vec<_> = leads.iter().flat_map(|l| l.comments.iter().copied()).collect();
    comment_ids.sort_unstable();
    comment_ids.dedup();

    let agents: HashMap<_, Agent> = store
        .agent_get_many(&agent_ids)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let comments: HashMap<_, Comment> = store
        .comment_get_many(&comment_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(leads
        .into_iter()
        .map(|lead| {
            let agent = lead.assigned_agent.and_then(|id| agents.get(&id).cloned());
            let resolved_comments = lead
                .comments
                .iter()
                .filter_map(|id| comments.get(id).cloned())
                .collect();
            ResolvedLead::from_parts(lead, agent, resolved_comments)
        })
        .collect())
}

/// Resolve a single lead.
pub async fn resolve_lead(store: &dyn CrmStore, lead: Lead) -> ApiResult<ResolvedLead> {
    resolve_leads(store, vec![lead])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_error("Lead resolution produced no result"))
}

/// Fetch and resolve a lead by id. A missing lead is `LEAD_NOT_FOUND`.
pub async fn get_resolved_lead(store: &dyn CrmStore, id: LeadId) -> ApiResult<ResolvedLead> {
    let lead = store
        .lead_get(id)
        .await?
        .ok_or_else(|| ApiError::from(crm_core::CrmError::not_found(EntityType::Lead, id)))?;
    resolve_lead(store, lead).await
}

/// The lead's comments in attachment order.
pub async fn lead_comments(store: &dyn CrmStore, id: LeadId) -> ApiResult<Vec<Comment>> {
    Ok(get_resolved_lead(store, id).await?.comments)
}
