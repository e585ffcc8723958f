//! Leadline Core - Entity Types
//!
//! Data structures shared by every other crate: identifiers, the four CRM
//! entities (agents, leads, comments, tags), partial-update and filter
//! types, the error taxonomy, and the pure arithmetic behind reporting.
//! Nothing in here touches storage or the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod entities;
pub mod error;
pub mod reporting;

pub use entities::*;
pub use error::*;
pub use reporting::*;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// Ordering ids therefore orders entities by creation time.
pub type EntityId = Uuid;

pub type AgentId = EntityId;
pub type LeadId = EntityId;
pub type CommentId = EntityId;
pub type TagId = EntityId;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

// ============================================================================
// ENTITY KINDS
// ============================================================================

/// Entity type discriminator, used in errors and collection naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Agent,
    Lead,
    Comment,
    Tag,
}

impl EntityType {
    /// Human-readable singular name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Agent => "Agent",
            EntityType::Lead => "Lead",
            EntityType::Comment => "Comment",
            EntityType::Tag => "Tag",
        }
    }

    /// Name of the backing collection.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Agent => "agents",
            EntityType::Lead => "leads",
            EntityType::Comment => "comments",
            EntityType::Tag => "tags",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_sort_by_creation() {
        let first = new_entity_id();
        let second = new_entity_id();
        assert!(first < second);
    }

    #[test]
    fn test_entity_type_names() {
        assert_eq!(EntityType::Lead.to_string(), "Lead");
        assert_eq!(EntityType::Comment.collection(), "comments");
        assert_eq!(EntityType::Tag.collection(), "tags");
    }
}
