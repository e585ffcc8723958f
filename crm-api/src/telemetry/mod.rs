//! Observability for the API layer: structured logging and Prometheus
//! metrics. Neither needs an external collector to run.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, CrmMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
