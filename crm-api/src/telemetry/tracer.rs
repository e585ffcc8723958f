//! Tracing subscriber initialization.

use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "crm_api=debug,tower_http=debug,info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    pub log_format: LogFormat,
    /// Serve `/metrics`
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `CRM_SERVICE_NAME` (default: crm-api)
    /// - `CRM_SERVICE_VERSION` (default: crate version)
    /// - `CRM_ENVIRONMENT` (default: development)
    /// - `CRM_LOG_FORMAT`: "json" or "pretty" (default: json)
    /// - `CRM_METRICS_ENABLED`: "true"/"1" (default: true)
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            service_name: lookup("CRM_SERVICE_NAME").unwrap_or_else(|| "crm-api".to_string()),
            service_version: lookup("CRM_SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            environment: lookup("CRM_ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            // An unknown format falls back to JSON rather than failing startup.
            log_format: lookup("CRM_LOG_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            metrics_enabled: lookup("CRM_METRICS_ENABLED")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(true),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. `RUST_LOG` overrides the default filter.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_telemetry_config_defaults() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.service_name, "crm-api");
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_telemetry_config_overrides() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("CRM_SERVICE_NAME", "leadline"),
            ("CRM_LOG_FORMAT", "pretty"),
            ("CRM_METRICS_ENABLED", "false"),
        ]));
        assert_eq!(config.service_name, "leadline");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_unknown_log_format_falls_back_to_json() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[("CRM_LOG_FORMAT", "xml")]));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
