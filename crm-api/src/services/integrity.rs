//! Comment link integrity
//!
//! Lead → comment links are maintained by a two-step write, so the two
//! sides can disagree. This module reports disagreements and re-links
//! comments whose lead still exists.

use std::collections::{HashMap, HashSet};

use crm_core::{Comment, CommentId, Lead, LeadFilter, LeadId};
use crm_storage::CrmStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// A (lead, comment) pair named in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommentLink {
    #[schema(value_type = String, format = "uuid")]
    pub lead: LeadId,
    #[schema(value_type = String, format = "uuid")]
    pub comment: CommentId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    /// Comments whose lead exists but does not list them. Repairable.
    pub orphaned_comments: Vec<CommentLink>,
    /// Comments whose lead does not exist.
    pub detached_comments: Vec<CommentLink>,
    /// Lead entries pointing at a missing comment or at a comment owned
    /// by another lead.
    pub dangling_comment_refs: Vec<CommentLink>,
    /// Comments a lead lists more than once, one entry per extra listing.
    pub duplicate_comment_refs: Vec<CommentLink>,
    pub consistent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RepairReport {
    pub repaired: u64,
}

/// Compare every comment's owner with every lead's comment list.
pub async fn check_comment_links(store: &dyn CrmStore) -> ApiResult<IntegrityReport> {
    let leads = store.lead_list(&LeadFilter::default()).await?;
    let comments = store.comment_list().await?;
    Ok(link_report(&leads, &comments))
}

fn link_report(leads: &[Lead], comments: &[Comment]) -> IntegrityReport {
    let listed: HashMap<LeadId, HashSet<CommentId>> = leads
        .iter()
        .map(|lead| (lead.id, lead.comments.iter().copied().collect()))
        .collect();
    let owners: HashMap<CommentId, LeadId> = comments.iter().map(|c| (c.id, c.lead)).collect();

    let mut report = IntegrityReport::default();

    for comment in comments {
        let link = CommentLink {
            lead: comment.lead,
            comment: comment.id,
        };
        match listed.get(&comment.lead) {
            Some(ids) if ids.contains(&comment.id) => {}
            Some(_) => report.orphaned_comments.push(link),
            None => report.detached_comments.push(link),
        }
    }

    for lead in leads {
        let mut seen = HashSet::new();
        for comment_id in &lead.comments {
            let link = CommentLink {
                lead: lead.id,
                comment: *comment_id,
            };
            if !seen.insert(*comment_id) {
                report.duplicate_comment_refs.push(link);
            } else if owners.get(comment_id) != Some(&lead.id) {
                report.dangling_comment_refs.push(link);
            }
        }
    }

    report.consistent = report.orphaned_comments.is_empty()
        && report.detached_comments.is_empty()
        && report.dangling_comment_refs.is_empty()
        && report.duplicate_comment_refs.is_empty();
    report
}

/// Append every orphaned comment to its lead, oldest first.
pub async fn repair_orphaned_comments(store: &dyn CrmStore) -> ApiResult<RepairReport> {
    let report = check_comment_links(store).await?;
    let mut repaired = 0u64;

    for link in report.orphaned_comments {
        match store.lead_push_comment(link.lead, link.comment).await {
            Ok(true) => repaired += 1,
            // Attachment finished its own append since the check ran.
            Ok(false) => continue,
            // Lead deleted since the check ran.
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if repaired > 0 {
        tracing::info!(repaired, "Re-linked orphaned comments");
    }
    Ok(RepairReport { repaired })
}
