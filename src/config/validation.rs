//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Validate identity provider URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Service descriptors are checked by the route table builder, which owns
//!   the path and URL rules

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check everything except the service list.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.backend_secs", timeouts.backend_secs),
        ("timeouts.discovery_secs", timeouts.discovery_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    let identity = &config.identity;
    if let Err(e) = Url::parse(&identity.issuer_url) {
        errors.push(ValidationError::new("identity.issuer_url", e.to_string()));
    }
    if let Some(jwks_url) = &identity.jwks_url {
        if let Err(e) = Url::parse(jwks_url) {
            errors.push(ValidationError::new("identity.jwks_url", e.to_string()));
        }
    }
    if identity.allowed_algorithms.is_empty() {
        errors.push(ValidationError::new(
            "identity.allowed_algorithms",
            "at least one algorithm is required",
        ));
    }
    if identity.jwks_ttl_secs == 0 {
        errors.push(ValidationError::new(
            "identity.jwks_ttl_secs",
            "must be greater than zero",
        ));
    }

    if let Some(url) = &config.registration.url {
        if let Err(e) = Url::parse(url) {
            errors.push(ValidationError::new("registration.url", e.to_string()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.backend_secs = 0;
        config.identity.issuer_url = "::".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.backend_secs",
                "identity.issuer_url"
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
