//! In-memory entity store.
//!
//! Collections are `BTreeMap`s keyed by UUIDv7, so iteration order is
//! creation order. One `RwLock` per collection gives per-document
//! atomicity; guards are never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ::async_trait::async_trait;
use crm_core::{
    group_by_status, Agent, AgentId, Comment, CommentId, CrmError, CrmResult, EntityType, Lead,
    LeadFilter, LeadId, LeadUpdate, NewAgent, NewComment, NewLead, NewTag, StatusCount,
    StorageError, Tag, TagId,
};

use crate::CrmStore;

fn read_lock<T>(lock: &RwLock<T>) -> CrmResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| CrmError::Storage(StorageError::LockPoisoned))
}

fn write_lock<T>(lock: &RwLock<T>) -> CrmResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| CrmError::Storage(StorageError::LockPoisoned))
}

/// Pick the entries of `map` named by `ids`, in the order requested.
fn pick<T: Clone>(map: &BTreeMap<uuid::Uuid, T>, ids: &[uuid::Uuid]) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

/// In-memory store used by default and throughout the test suites.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    agents: Arc<RwLock<BTreeMap<AgentId, Agent>>>,
    leads: Arc<RwLock<BTreeMap<LeadId, Lead>>>,
    comments: Arc<RwLock<BTreeMap<CommentId, Comment>>>,
    tags: Arc<RwLock<BTreeMap<TagId, Tag>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored leads.
    pub fn lead_total(&self) -> usize {
        self.leads.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Get count of stored comments.
    pub fn comment_total(&self) -> usize {
        self.comments.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Get count of stored tags.
    pub fn tag_total(&self) -> usize {
        self.tags.read().map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CrmStore for InMemoryStore {
    // === Agent Operations ===

    async fn agent_insert(&self, new: NewAgent) -> CrmResult<Agent> {
        let agent = Agent::from_new(new);
        write_lock(&self.agents)?.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn agent_list(&self) -> CrmResult<Vec<Agent>> {
        Ok(read_lock(&self.agents)?.values().cloned().collect())
    }

    async fn agent_get_many(&self, ids: &[AgentId]) -> CrmResult<Vec<Agent>> {
        Ok(pick(&*read_lock(&self.agents)?, ids))
    }

    // === Lead Operations ===

    async fn lead_insert(&self, new: NewLead) -> CrmResult<Lead> {
        let lead = Lead::from_new(new);
        write_lock(&self.leads)?.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn lead_get(&self, id: LeadId) -> CrmResult<Option<Lead>> {
        Ok(read_lock(&self.leads)?.get(&id).cloned())
    }

    async fn lead_list(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>> {
        let leads = read_lock(&self.leads)?;
        Ok(leads
            .values()
            .filter(|lead| filter.matches(lead))
            .cloned()
            .collect())
    }

    async fn lead_update(&self, id: LeadId, update: LeadUpdate) -> CrmResult<Lead> {
        let mut leads = write_lock(&self.leads)?;
        let lead = leads
            .get_mut(&id)
            .ok_or_else(|| CrmError::not_found(EntityType::Lead, id))?;
        lead.apply_update(update);
        Ok(lead.clone())
    }

    async fn lead_delete(&self, id: LeadId) -> CrmResult<()> {
        write_lock(&self.leads)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CrmError::not_found(EntityType::Lead, id))
    }

    async fn lead_push_comment(&self, id: LeadId, comment_id: CommentId) -> CrmResult<bool> {
        let mut leads = write_lock(&self.leads)?;
        let lead = leads
            .get_mut(&id)
            .ok_or_else(|| CrmError::not_found(EntityType::Lead, id))?;
        Ok(lead.push_comment(comment_id))
    }

    async fn lead_add_tags(&self, id: LeadId, tags: Vec<String>) -> CrmResult<Lead> {
        let mut leads = write_lock(&self.leads)?;
        let lead = leads
            .get_mut(&id)
            .ok_or_else(|| CrmError::not_found(EntityType::Lead, id))?;
        lead.add_tags(tags);
        Ok(lead.clone())
    }

    async fn lead_count(&self, filter: &LeadFilter) -> CrmResult<u64> {
        let leads = read_lock(&self.leads)?;
        Ok(leads.values().filter(|lead| filter.matches(lead)).count() as u64)
    }

    async fn lead_status_counts(&self) -> CrmResult<Vec<StatusCount>> {
        let leads = read_lock(&self.leads)?;
        Ok(group_by_status(
            leads.values().map(|lead| lead.status.as_deref()),
        ))
    }

    // === Comment Operations ===

    async fn comment_insert(&self, new: NewComment) -> CrmResult<Comment> {
        let comment = Comment::from_new(new);
        write_lock(&self.comments)?.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comment_get_many(&self, ids: &[CommentId]) -> CrmResult<Vec<Comment>> {
        Ok(pick(&*read_lock(&self.comments)?, ids))
    }

    async fn comment_list(&self) -> CrmResult<Vec<Comment>> {
        Ok(read_lock(&self.comments)?.values().cloned().collect())
    }

    // === Tag Operations ===

    async fn tag_insert(&self, new: NewTag) -> CrmResult<Tag> {
        new.validate()?;

        // Uniqueness check and insert happen under one write guard.
        let mut tags = write_lock(&self.tags)?;
        if tags.values().any(|t| t.name == new.name) {
            return Err(StorageError::Conflict {
                entity_type: EntityType::Tag,
                field: "name".to_string(),
                value: new.name,
            }
            .into());
        }
        let tag = Tag::from_new(new);
        tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn tag_list(&self) -> CrmResult<Vec<Tag>> {
        Ok(read_lock(&self.tags)?.values().cloned().collect())
    }

    async fn ping(&self) -> CrmResult<()> {
        read_lock(&self.leads).map(|_| ())
    }
}

// ============================================================================
// TESTS
// ============================================================================
