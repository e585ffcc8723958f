//! Core entity structures
//!
//! Wire format: every entity serializes its id as `_id` and the remaining
//! fields in camelCase. Free-form string fields are optional because the
//! lead-tracking schema declares no required fields apart from `Tag.name`.

use crate::{
    new_entity_id, AgentId, CommentId, EntityType, LeadId, TagId, Timestamp, ValidationError,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a present field (including an explicit `null`) as `Some(_)`.
///
/// Paired with `#[serde(default)]` on an `Option<Option<T>>` field this gives
/// three states: absent (`None`), `null` (`Some(None)`), value (`Some(Some(v))`).
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// AGENT
// ============================================================================

/// Sales agent that leads can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(rename = "_id")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Fields accepted when creating an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct NewAgent {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Agent {
    /// Materialize a new agent with a fresh id and timestamps.
    pub fn from_new(new: NewAgent) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: new.name,
            email: new.email,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// LEAD
// ============================================================================

/// A sales lead as stored: references are kept as ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: LeadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Append-only; maintained by comment attachment.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub comments: Vec<CommentId>,
    /// Tag names with set semantics, kept in first-insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Fields accepted when creating a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct NewLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent: Option<AgentId>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
}

/// Partial lead update with shallow-merge semantics.
///
/// Only fields present in the payload are written. `assignedAgent` may be
/// sent as `null` to clear the assignment. The comment list cannot be
/// patched; it only grows through comment attachment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct LeadUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    #[serde(deserialize_with = "deserialize_present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent: Option<Option<AgentId>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    /// Replaces the whole tag set when present.
    pub tags: Option<Vec<String>>,
}

impl LeadUpdate {
    /// True when the update carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.source.is_none()
            && self.assigned_agent.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.tags.is_none()
    }
}

impl Lead {
    /// Materialize a new lead with a fresh id, timestamps and an empty
    /// comment list. Duplicate tags in the request are collapsed.
    pub fn from_new(new: NewLead) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: new.name,
            email: new.email,
            source: new.source,
            assigned_agent: new.assigned_agent,
            priority: new.priority,
            status: new.status,
            comments: Vec::new(),
            tags: dedup_tags(new.tags),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a shallow merge of the provided fields and bump `updated_at`.
    pub fn apply_update(&mut self, update: LeadUpdate) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(source) = update.source {
            self.source = Some(source);
        }
        if let Some(assigned_agent) = update.assigned_agent {
            self.assigned_agent = assigned_agent;
        }
        if let Some(priority) = update.priority {
            self.priority = Some(priority);
        }
        if let Some(status) = update.status {
            self.status = Some(status);
        }
        if let Some(tags) = update.tags {
            self.tags = dedup_tags(tags);
        }
        self.updated_at = Utc::now();
    }

    /// Union `tags` into the lead's tag set. Returns how many were new.
    pub fn add_tags<I>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let added = merge_tags(&mut self.tags, tags);
        self.updated_at = Utc::now();
        added
    }

    /// Append a comment id unless the lead already lists it. Returns
    /// whether it was appended.
    pub fn push_comment(&mut self, comment_id: CommentId) -> bool {
        if self.comments.contains(&comment_id) {
            return false;
        }
        self.comments.push(comment_id);
        self.updated_at = Utc::now();
        true
    }
}

/// Union `incoming` into `existing`, keeping existing order and appending
/// unseen names in the order given. Returns the number appended.
pub fn merge_tags<I>(existing: &mut Vec<String>, incoming: I) -> usize
where
    I: IntoIterator<Item = String>,
{
    let before = existing.len();
    for tag in incoming {
        if !existing.contains(&tag) {
            existing.push(tag);
        }
    }
    existing.len() - before
}

/// Collapse duplicate tag names, keeping first occurrences.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tags.len());
    merge_tags(&mut out, tags);
    out
}

// ============================================================================
// LEAD FILTER
// ============================================================================

/// Exact-match lead filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub assigned_agent: Option<AgentId>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub priority: Option<String>,
}

impl LeadFilter {
    /// Filter matching a single status value.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_agent.is_none()
            && self.status.is_none()
            && self.source.is_none()
            && self.priority.is_none()
    }

    /// Check whether a lead satisfies every set criterion.
    pub fn matches(&self, lead: &Lead) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
            match wanted {
                Some(w) => actual.as_deref() == Some(w.as_str()),
                None => true,
            }
        }

        let agent_ok = match self.assigned_agent {
            Some(agent) => lead.assigned_agent == Some(agent),
            None => true,
        };

        agent_ok
            && field_matches(&self.status, &lead.status)
            && field_matches(&self.source, &lead.source)
            && field_matches(&self.priority, &lead.priority)
    }
}

// ============================================================================
// RESOLVED LEAD
// ============================================================================

/// Lead with `assignedAgent` and `comments` expanded into full documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLead {
    #[serde(rename = "_id")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: LeadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub assigned_agent: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub comments: Vec<Comment>,
    pub tags: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl ResolvedLead {
    /// Combine a stored lead with its already-fetched relations.
    pub fn from_parts(lead: Lead, assigned_agent: Option<Agent>, comments: Vec<Comment>) -> Self {
        Self {
            id: lead.id,
            name: lead.name,
            email: lead.email,
            source: lead.source,
            assigned_agent,
            priority: lead.priority,
            status: lead.status,
            comments,
            tags: lead.tags,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

// ============================================================================
// COMMENT
// ============================================================================

/// Note attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: CommentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead: LeadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Fields needed to create a comment. The owning lead always comes from
/// the caller's context, never from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub lead: LeadId,
    pub comment_text: Option<String>,
    pub author: Option<String>,
}

impl Comment {
    pub fn from_new(new: NewComment) -> Self {
        Self {
            id: new_entity_id(),
            lead: new.lead,
            comment_text: new.comment_text,
            author: new.author,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// TAG
// ============================================================================

/// Named label in the tag catalog. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(rename = "_id")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: TagId,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Fields accepted when creating a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct NewTag {
    pub name: String,
}

impl NewTag {
    /// Enforce the required-name constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                entity_type: EntityType::Tag,
                field: "name".to_string(),
            });
        }
        Ok(())
    }
}

impl Tag {
    pub fn from_new(new: NewTag) -> Self {
        Self {
            id: new_entity_id(),
            name: new.name,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_lead(status: Option<&str>) -> Lead {
        Lead::from_new(NewLead {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            source: Some("Website".to_string()),
            status: status.map(str::to_string),
            priority: Some("High".to_string()),
            ..NewLead::default()
        })
    }

    #[test]
    fn test_lead_from_new_collapses_duplicate_tags() {
        let lead = Lead::from_new(NewLead {
            tags: vec!["hot".into(), "vip".into(), "hot".into()],
            ..NewLead::default()
        });
        assert_eq!(lead.tags, vec!["hot".to_string(), "vip".to_string()]);
        assert!(lead.comments.is_empty());
        assert_eq!(lead.created_at, lead.updated_at);
    }

    #[test]
    fn test_add_tags_is_a_union() {
        let mut lead = make_lead(None);
        assert_eq!(lead.add_tags(vec!["A".to_string(), "B".to_string()]), 2);
        assert_eq!(lead.add_tags(vec!["B".to_string(), "C".to_string()]), 1);
        assert_eq!(lead.tags, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_apply_update_is_shallow() {
        let mut lead = make_lead(Some("New"));
        let agent = new_entity_id();
        lead.apply_update(LeadUpdate {
            status: Some("Contacted".to_string()),
            assigned_agent: Some(Some(agent)),
            ..LeadUpdate::default()
        });
        assert_eq!(lead.status.as_deref(), Some("Contacted"));
        assert_eq!(lead.assigned_agent, Some(agent));
        assert_eq!(lead.name.as_deref(), Some("Ada"));
        assert_eq!(lead.source.as_deref(), Some("Website"));

        lead.apply_update(LeadUpdate {
            assigned_agent: Some(None),
            ..LeadUpdate::default()
        });
        assert_eq!(lead.assigned_agent, None);
        assert_eq!(lead.status.as_deref(), Some("Contacted"));
    }

    #[test]
    fn test_lead_update_distinguishes_null_from_absent() -> Result<(), serde_json::Error> {
        let absent: LeadUpdate = serde_json::from_str(r#"{"status":"Closed"}"#)?;
        assert_eq!(absent.assigned_agent, None);

        let cleared: LeadUpdate = serde_json::from_str(r#"{"assignedAgent":null}"#)?;
        assert_eq!(cleared.assigned_agent, Some(None));

        let id = new_entity_id();
        let set: LeadUpdate =
            serde_json::from_value(serde_json::json!({ "assignedAgent": id.to_string() }))?;
        assert_eq!(set.assigned_agent, Some(Some(id)));
        assert!(!set.is_empty());
        assert!(LeadUpdate::default().is_empty());
        Ok(())
    }

    #[test]
    fn test_lead_update_ignores_comment_list() -> Result<(), serde_json::Error> {
        let update: LeadUpdate =
            serde_json::from_str(r#"{"comments":["not-a-real-id"],"priority":"Low"}"#)?;
        assert_eq!(update.priority.as_deref(), Some("Low"));
        Ok(())
    }

    #[test]
    fn test_lead_wire_format() -> Result<(), serde_json::Error> {
        let lead = make_lead(Some("New"));
        let json = serde_json::to_value(&lead)?;
        assert_eq!(json["_id"], serde_json::json!(lead.id.to_string()));
        assert_eq!(json["status"], "New");
        assert!(json.get("assignedAgent").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("id").is_none());

        let back: Lead = serde_json::from_value(json)?;
        assert_eq!(back, lead);
        Ok(())
    }

    #[test]
    fn test_filter_matches_exactly() {
        let lead = make_lead(Some("New"));
        assert!(LeadFilter::default().matches(&lead));
        assert!(LeadFilter::with_status("New").matches(&lead));
        assert!(!LeadFilter::with_status("new").matches(&lead));
        assert!(!LeadFilter::with_status("Qualified").matches(&lead));

        let by_agent = LeadFilter {
            assigned_agent: Some(new_entity_id()),
            ..LeadFilter::default()
        };
        assert!(!by_agent.matches(&lead));

        let combined = LeadFilter {
            status: Some("New".into()),
            source: Some("Website".into()),
            priority: Some("High".into()),
            ..LeadFilter::default()
        };
        assert!(combined.matches(&lead));
        assert!(!combined.is_empty());
    }

    #[test]
    fn test_filter_on_missing_field_never_matches() {
        let lead = make_lead(None);
        assert!(!LeadFilter::with_status("New").matches(&lead));
    }

    #[test]
    fn test_new_tag_requires_name() {
        assert!(NewTag::default().validate().is_err());
        assert!(NewTag { name: "vip".into() }.validate().is_ok());

        let missing: NewTag = serde_json::from_str("{}").unwrap_or_default();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_resolved_lead_keeps_comment_order() {
        let lead = make_lead(Some("New"));
        let first = Comment::from_new(NewComment {
            lead: lead.id,
            comment_text: Some("first".into()),
            author: None,
        });
        let second = Comment::from_new(NewComment {
            lead: lead.id,
            comment_text: Some("second".into()),
            author: None,
        });
        let resolved =
            ResolvedLead::from_parts(lead.clone(), None, vec![first.clone(), second.clone()]);
        assert_eq!(resolved.comments, vec![first, second]);
        assert_eq!(resolved.assigned_agent, None);
        assert_eq!(resolved.tags, lead.tags);
    }

    proptest! {
        #[test]
        fn prop_merge_tags_never_duplicates(
            a in prop::collection::vec("[a-c]{1,2}", 0..8),
            b in prop::collection::vec("[a-c]{1,2}", 0..8),
        ) {
            let mut tags = dedup_tags(a.clone());
            merge_tags(&mut tags, b.clone());
            let mut sorted = tags.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), tags.len());
            for t in a.iter().chain(b.iter()) {
                prop_assert!(tags.contains(t));
            }
        }

        #[test]
        fn prop_merge_tags_is_idempotent(tags in prop::collection::vec("[a-z]{1,4}", 0..10)) {
            let mut once = Vec::new();
            merge_tags(&mut once, tags.clone());
            let mut twice = once.clone();
            let added = merge_tags(&mut twice, tags);
            prop_assert_eq!(added, 0);
            prop_assert_eq!(once, twice);
        }
    }
}
