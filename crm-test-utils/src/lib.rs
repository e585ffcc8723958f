//! Leadline Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for entity payloads
//! - Fixtures for common scenarios
//! - Assertions for Leadline error shapes

use crm_core::{
    Agent, AgentId, CrmError, CrmResult, EntityType, Lead, NewAgent, NewLead, NewTag,
    StatusCount, StorageError, ValidationError, STATUS_CLOSED, STATUS_NEW,
};
use crm_storage::CrmStore;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Leadline payloads.

    use super::*;
    use proptest::prelude::*;

    /// Generate a pipeline status, including statuses outside the usual set.
    pub fn arb_status() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => Just(STATUS_NEW.to_string()),
            3 => Just(STATUS_CLOSED.to_string()),
            2 => Just("Contacted".to_string()),
            2 => Just("Qualified".to_string()),
            1 => "[A-Z][a-z]{2,10}",
        ]
    }

    /// Generate a short tag name.
    pub fn arb_tag_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    /// Generate a tag list that may contain duplicates.
    pub fn arb_tag_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_tag_name(), 0..8)
    }

    /// Generate a lead payload with no agent reference.
    pub fn arb_new_lead() -> impl Strategy<Value = NewLead> {
        (
            prop::option::of("[A-Z][a-z]{1,12} [A-Z][a-z]{1,12}"),
            prop::option::of("[a-z]{1,10}@[a-z]{1,8}\\.com"),
            prop::option::of(prop_oneof![
                Just("web".to_string()),
                Just("referral".to_string()),
                Just("event".to_string()),
            ]),
            prop::option::of(prop_oneof![
                Just("low".to_string()),
                Just("medium".to_string()),
                Just("high".to_string()),
            ]),
            prop::option::of(arb_status()),
            arb_tag_names(),
        )
            .prop_map(|(name, email, source, priority, status, tags)| NewLead {
                name,
                email,
                source,
                assigned_agent: None,
                priority,
                status,
                tags,
            })
    }

    /// Generate a list of lead statuses, `None` meaning the field is absent.
    pub fn arb_status_list() -> impl Strategy<Value = Vec<Option<String>>> {
        prop::collection::vec(prop::option::weighted(0.9, arb_status()), 0..40)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built payloads and store seeding helpers.

    use super::*;

    /// A lead in the given status with nothing else filled in.
    pub fn lead_with_status(status: &str) -> NewLead {
        NewLead {
            status: Some(status.to_string()),
            ..NewLead::default()
        }
    }

    /// A fully populated lead payload.
    pub fn sample_lead() -> NewLead {
        NewLead {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            source: Some("web".to_string()),
            assigned_agent: None,
            priority: Some("high".to_string()),
            status: Some(STATUS_NEW.to_string()),
            tags: vec!["vip".to_string()],
        }
    }

    /// A lead payload assigned to `agent`.
    pub fn lead_for_agent(agent: AgentId) -> NewLead {
        NewLead {
            assigned_agent: Some(agent),
            ..sample_lead()
        }
    }

    pub fn sample_agent() -> NewAgent {
        NewAgent {
            name: Some("Grace Hopper".to_string()),
            email: Some("grace@agency.com".to_string()),
        }
    }

    pub fn tag(name: &str) -> NewTag {
        NewTag {
            name: name.to_string(),
        }
    }

    /// Insert one lead per status, in order.
    pub async fn seed_pipeline(store: &dyn CrmStore, statuses: &[&str]) -> CrmResult<Vec<Lead>> {
        let mut leads = Vec::with_capacity(statuses.len());
        for status in statuses {
            leads.push(store.lead_insert(lead_with_status(status)).await?);
        }
        Ok(leads)
    }

    /// Insert an agent and a lead assigned to them.
    pub async fn seed_assigned_lead(store: &dyn CrmStore) -> CrmResult<(Agent, Lead)> {
        let agent = store.agent_insert(sample_agent()).await?;
        let lead = store.lead_insert(lead_for_agent(agent.id)).await?;
        Ok((agent, lead))
    }

    /// Look up the count for `status` in a pipeline report.
    pub fn count_of(groups: &[StatusCount], status: &str) -> Option<u64> {
        groups
            .iter()
            .find(|g| g.status.as_deref() == Some(status))
            .map(|g| g.count)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Leadline results.

    use super::*;

    /// Assert that a CrmResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CrmResult<T>, entity_type: EntityType) {
        match result {
            Err(CrmError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a CrmResult is a uniqueness conflict on `field`.
    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &CrmResult<T>, field: &str) {
        match result {
            Err(CrmError::Storage(StorageError::Conflict { field: f, .. })) => {
                assert_eq!(f, field, "Wrong field in Conflict error");
            }
            other => panic!("Expected Conflict on {}, got: {:?}", field, other),
        }
    }

    /// Assert that a CrmResult failed because `field` was missing.
    #[track_caller]
    pub fn assert_missing_field<T: std::fmt::Debug>(result: &CrmResult<T>, field: &str) {
        match result {
            Err(CrmError::Validation(ValidationError::RequiredFieldMissing { field: f, .. })) => {
                assert_eq!(f, field, "Wrong field in validation error");
            }
            other => panic!("Expected missing {}, got: {:?}", field, other),
        }
    }

    /// Assert that a JSON body carries the given API error code.
    #[track_caller]
    pub fn assert_error_code(body: &serde_json::Value, code: &str) {
        assert_eq!(
            body.get("code").and_then(|c| c.as_str()),
            Some(code),
            "Unexpected error body: {}",
            body
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
