//! Leadline API - REST Layer
//!
//! Axum routers over a `CrmStore`. The store is either the in-memory
//! implementation from crm-storage or the Postgres document store in
//! [`db`], picked at startup from `CRM_STORE`.

mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use config::{ApiConfig, StoreBackend};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, DynStore};
pub use types::*;
