//! REST API Routes Module
//!
//! One router per resource, merged into a single application router with
//! health checks, metrics, the OpenAPI document and CORS.

pub mod agent;
pub mod comment;
pub mod health;
pub mod integrity;
pub mod lead;
pub mod reporting;
pub mod tag;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware, TelemetryConfig};
use crate::types::ORPHANED_COMMENT_HEADER;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origins allow everything; otherwise only the listed origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(ORPHANED_COMMENT_HEADER)])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

/// Routes for every resource, still waiting for state.
pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .merge(lead::create_router())
        .merge(comment::create_router())
        .merge(tag::create_router())
        .merge(agent::create_router())
        .merge(reporting::create_router())
        .merge(integrity::create_router())
        .merge(health::create_router())
}

/// Create the complete API router.
///
/// - Resource routes at the root (`/leads`, `/tags`, `/agents`, ...)
/// - Health checks at /health/*
/// - Metrics at /metrics (when enabled)
/// - OpenAPI document at /openapi.json
/// - Swagger UI at /swagger-ui (with the swagger-ui feature)
pub fn create_api_router(
    state: AppState,
    api_config: &ApiConfig,
    telemetry: &TelemetryConfig,
) -> Router {
    let mut router: Router = resource_routes()
        .with_state(state)
        .route("/openapi.json", get(openapi_json));

    if telemetry.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        // `/openapi.json` is already taken by openapi_json.
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/swagger-ui/openapi.json", ApiDoc::openapi()),
        );
    }

    let cors = build_cors_layer(api_config);

    // Execution order: CORS -> Observability -> Trace -> Handler
    router
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(observability_middleware))
        .layer(cors)
}
