//! Leadline Storage - Entity Store Trait and In-Memory Implementation
//!
//! Defines the storage contract every backend honors. The Postgres
//! document store lives in crm-api next to its connection pool.

pub mod memory;

pub use memory::InMemoryStore;

use ::async_trait::async_trait;
use crm_core::{
    Agent, AgentId, Comment, CommentId, CrmResult, Lead, LeadFilter, LeadId, LeadUpdate,
    NewAgent, NewComment, NewLead, NewTag, StatusCount, Tag,
};

/// Async store for the four CRM collections.
///
/// Each operation is atomic for the single document it touches. Nothing
/// here spans documents: callers that need two writes (comment
/// attachment) issue them separately and live with the gap between them.
#[async_trait]
pub trait CrmStore: Send + Sync {
    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    /// Insert a new agent, assigning its id and timestamps.
    async fn agent_insert(&self, new: NewAgent) -> CrmResult<Agent>;

    /// List every agent in creation order.
    async fn agent_list(&self) -> CrmResult<Vec<Agent>>;

    /// Fetch the agents that exist among `ids`. Unknown ids are skipped.
    async fn agent_get_many(&self, ids: &[AgentId]) -> CrmResult<Vec<Agent>>;

    // ========================================================================
    // LEAD OPERATIONS
    // ========================================================================

    /// Insert a new lead.
    async fn lead_insert(&self, new: NewLead) -> CrmResult<Lead>;

    /// Get a lead by ID.
    async fn lead_get(&self, id: LeadId) -> CrmResult<Option<Lead>>;

    /// List leads matching `filter` in creation order.
    async fn lead_list(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>>;

    /// Shallow-merge `update` into the lead. Fails with NotFound if absent.
    async fn lead_update(&self, id: LeadId, update: LeadUpdate) -> CrmResult<Lead>;

    /// Delete a lead. Comments and other references are left in place.
    async fn lead_delete(&self, id: LeadId) -> CrmResult<()>;

    /// Append a comment id to the lead's comment list unless it is already
    /// listed. Returns whether the id was appended.
    async fn lead_push_comment(&self, id: LeadId, comment_id: CommentId) -> CrmResult<bool>;

    /// Union `tags` into the lead's tag set.
    async fn lead_add_tags(&self, id: LeadId, tags: Vec<String>) -> CrmResult<Lead>;

    /// Count leads matching `filter`.
    async fn lead_count(&self, filter: &LeadFilter) -> CrmResult<u64>;

    /// Group all leads by status. Group order is unspecified.
    async fn lead_status_counts(&self) -> CrmResult<Vec<StatusCount>>;

    // ========================================================================
    // COMMENT OPERATIONS
    // ========================================================================

    /// Insert a comment. Does not verify that the owning lead exists.
    async fn comment_insert(&self, new: NewComment) -> CrmResult<Comment>;

    /// Fetch the comments that exist among `ids`. Unknown ids are skipped.
    async fn comment_get_many(&self, ids: &[CommentId]) -> CrmResult<Vec<Comment>>;

    /// List every comment in creation order.
    async fn comment_list(&self) -> CrmResult<Vec<Comment>>;

    // ========================================================================
    // TAG OPERATIONS
    // ========================================================================

    /// Insert a tag. Fails on a missing name or a name already taken.
    async fn tag_insert(&self, new: NewTag) -> CrmResult<Tag>;

    /// List every tag in creation order.
    async fn tag_list(&self) -> CrmResult<Vec<Tag>>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Verify the backend is reachable.
    async fn ping(&self) -> CrmResult<()>;
}
