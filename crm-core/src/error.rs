//! Error types for Leadline operations

use crate::{EntityId, EntityType};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    #[error("Conflict on {entity_type:?}: {field} '{value}' already exists")]
    Conflict {
        entity_type: EntityType,
        field: String,
        value: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity_type:?} validation failed: {field} is required")]
    RequiredFieldMissing {
        entity_type: EntityType,
        field: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Leadline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrmError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CrmError {
    /// Shorthand for a storage-level not-found.
    pub fn not_found(entity_type: EntityType, id: EntityId) -> Self {
        CrmError::Storage(StorageError::NotFound { entity_type, id })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CrmError::Storage(StorageError::NotFound { .. }))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CrmError::Storage(StorageError::Conflict { .. }))
    }
}

/// Result type alias for Leadline operations.
pub type CrmResult<T> = Result<T, CrmError>;

// =============================================================================
// TESTS
// =============================================================================
