//! Comment attachment
//!
//! Creating a comment touches two documents: the comment is inserted, then
//! its id is appended to the owning lead. The two writes are independent.
//! When the lead is missing the comment is kept and reported as orphaned.

use crm_core::{Comment, LeadId, NewComment};
use crm_storage::CrmStore;

use crate::error::ApiResult;

/// Result of attaching a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedComment {
    pub comment: Comment,
    /// False when the owning lead did not exist at append time.
    pub linked: bool,
}

/// Insert a comment for `lead_id` and append it to that lead.
pub async fn attach_comment(
    store: &dyn CrmStore,
    lead_id: LeadId,
    comment_text: Option<String>,
    author: Option<String>,
) -> ApiResult<AttachedComment> {
    let comment = store
        .comment_insert(NewComment {
            lead: lead_id,
            comment_text,
            author,
        })
        .await?;

    let linked = match store.lead_push_comment(lead_id, comment.id).await {
        // Already listed means repair linked it first.
        Ok(_) => true,
        Err(e) if e.is_not_found() => {
            tracing::warn!(
                lead_id = %lead_id,
                comment_id = %comment.id,
                "Comment created for a lead that does not exist"
            );
            false
        }
        Err(e) => return Err(e.into()),
    };

    Ok(AttachedComment { comment, linked })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::{new_entity_id, NewLead};
    use crm_storage::InMemoryStore;

    #[tokio::test]
    async fn test_attach_appends_to_lead() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let lead = store.lead_insert(NewLead::default()).await?;

        let attached = attach_comment(&store, lead.id, Some("hello".into()), None).await?;
        assert!(attached.linked);
        assert_eq!(attached.comment.lead, lead.id);

        let lead = store.lead_get(lead.id).await?;
        assert_eq!(lead.map(|l| l.comments), Some(vec![attached.comment.id]));
        Ok(())
    }

    #[tokio::test]
    async fn test_attach_to_missing_lead_keeps_comment() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let ghost = new_entity_id();

        let attached =
            attach_comment(&store, ghost, Some("lost".into()), Some("sam".into())).await?;
        assert!(!attached.linked);
        assert_eq!(attached.comment.lead, ghost);
        assert_eq!(store.comment_total(), 1);
        assert_eq!(store.lead_total(), 0);
        Ok(())
    }
}
