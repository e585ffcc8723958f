//! Leadline API Server Entry Point

use std::sync::Arc;

use axum::Router;
use crm_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbClient, DbConfig, DynStore,
    StoreBackend,
};
use crm_api::telemetry::{init_tracing, TelemetryConfig};
use crm_storage::InMemoryStore;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env()
        .map_err(|e| ApiError::invalid_input(format!("Invalid configuration: {}", e)))?;

    let store = open_store(api_config.store).await?;
    let app: Router = create_api_router(AppState::new(store), &api_config, &telemetry_config);

    let addr = api_config
        .bind_addr()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address: {}", e)))?;
    tracing::info!(%addr, store = %api_config.store, "Starting Leadline API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

async fn open_store(backend: StoreBackend) -> ApiResult<DynStore> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db_config = DbConfig::from_env();
            let db = DbClient::from_config(&db_config)?;
            db.ensure_schema().await?;
            tracing::info!(
                host = %db_config.host,
                dbname = %db_config.dbname,
                pool_size = db.pool_size(),
                "Connected to Postgres"
            );
            Ok(Arc::new(db))
        }
    }
}
