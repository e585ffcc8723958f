//! API Configuration Module
//!
//! CORS, bind address and storage backend selection. Everything is read
//! from environment variables with development-friendly defaults.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crm_core::ConfigError;

// ============================================================================
// STORE BACKEND
// ============================================================================

/// Which `CrmStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "CRM_STORE".to_string(),
                value: other.to_string(),
                reason: "expected 'memory' or 'postgres'".to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Postgres => f.write_str("postgres"),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, the listening socket and storage.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Host/interface to bind.
    pub bind_host: String,

    pub port: u16,

    pub store: StoreBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            store: StoreBackend::Memory,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CRM_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `CRM_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `CRM_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `CRM_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `CRM_API_PORT`: Listening port (default: 3000)
    /// - `CRM_STORE`: "memory" or "postgres" (default: memory)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("CRM_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("CRM_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = lookup("CRM_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let bind_host = lookup("CRM_API_BIND").unwrap_or(defaults.bind_host);

        let port = match lookup("PORT").or_else(|| lookup("CRM_API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let store = match lookup("CRM_STORE") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => defaults.store,
        };

        Ok(Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            bind_host,
            port,
            store,
        })
    }

    /// Socket address the server listens on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "CRM_API_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
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
    fn test_default_config() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(|_| None)?;
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.bind_addr()?.to_string(), "0.0.0.0:3000");
        Ok(())
    }

    #[test]
    fn test_port_precedence_and_origins() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("CRM_API_PORT", "9090"),
            ("CRM_CORS_ORIGINS", "https://crm.example.com, ,https://app.example.com"),
            ("CRM_STORE", "Postgres"),
        ]))?;
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.store, StoreBackend::Postgres);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_port = ApiConfig::from_lookup(lookup_from(&[("CRM_API_PORT", "eighty")]));
        assert!(matches!(bad_port, Err(ConfigError::InvalidValue { .. })));

        let bad_store = ApiConfig::from_lookup(lookup_from(&[("CRM_STORE", "mongo")]));
        assert!(matches!(bad_store, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_bad_bind_host() {
        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
