//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crm_storage::{CrmStore, InMemoryStore};

/// Store handle shared by every handler.
pub type DynStore = Arc<dyn CrmStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }

    /// State backed by a fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

crate::impl_from_ref!(DynStore, store);
crate::impl_from_ref!(Instant, start_time);
