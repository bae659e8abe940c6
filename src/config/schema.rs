//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend service descriptors, one route each.
    pub services: Vec<ServiceConfig>,

    /// Identity provider used to validate bearer tokens.
    pub identity: IdentityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Header forwarding policy.
    pub forwarding: ForwardingConfig,

    /// Public registration endpoint.
    pub registration: RegistrationConfig,

    /// CORS allow-lists applied to every response.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A backend service the gateway routes to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service identifier, used in diagnostics only.
    pub name: String,

    /// Backend base URL (e.g., "http://tournaments:8080").
    pub url: String,

    /// Additional instances of the same service, balanced round-robin with `url`.
    #[serde(default)]
    pub replicas: Vec<String>,

    /// External prefix and backend rewrite.
    pub proxy: ProxyRule,
}

impl ServiceConfig {
    /// Every configured base URL, primary first.
    pub fn target_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.url.as_str()).chain(self.replicas.iter().map(String::as_str))
    }
}

/// Path mapping for a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyRule {
    /// External path prefix (e.g., "/api").
    pub prefix: String,

    /// Path prefix the backend expects (e.g., "/tournaments").
    #[serde(default)]
    pub rewrite: String,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// OIDC issuer URL; discovery runs against `{issuer_url}/.well-known/openid-configuration`.
    pub issuer_url: String,

    /// Explicit JWKS URL. Skips discovery when set.
    pub jwks_url: Option<String>,

    /// Local JWKS document. Takes precedence over `jwks_url` and discovery.
    pub jwks_file: Option<PathBuf>,

    /// Expected `aud` claim. Audience is not checked when unset.
    pub audience: Option<String>,

    /// Signature algorithms accepted in token headers.
    pub allowed_algorithms: Vec<Algorithm>,

    /// Clock skew tolerance for `exp`/`nbf` in seconds.
    pub leeway_secs: u64,

    /// How long fetched key material stays fresh.
    pub jwks_ttl_secs: u64,

    /// Minimum spacing between refreshes triggered by an unknown `kid`.
    pub min_refresh_interval_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            issuer_url: "http://localhost:8180/realms/gateway".to_string(),
            jwks_url: None,
            jwks_file: None,
            audience: None,
            allowed_algorithms: vec![Algorithm::RS256],
            leeway_secs: 60,
            jwks_ttl_secs: 300,
            min_refresh_interval_secs: 30,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for a backend to start responding, in seconds.
    pub backend_secs: u64,

    /// Timeout for identity provider discovery and key fetches, in seconds.
    pub discovery_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            backend_secs: 30,
            discovery_secs: 10,
        }
    }
}

/// Header forwarding policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Pass the validated `Authorization` header on to backends.
    pub forward_authorization: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            forward_authorization: true,
        }
    }
}

/// Registration collaborator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Base URL of the service handling `POST /api/register`.
    pub url: Option<String>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway from a browser.
    pub allowed_origins: Vec<String>,

    /// Request headers browsers may send.
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_headers: vec![
                "origin".to_string(),
                "content-type".to_string(),
                "accept".to_string(),
                "authorization".to_string(),
            ],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[services]]
            name = "tournaments"
            url = "http://svc:8080"
            proxy = { prefix = "/api", rewrite = "/tournaments" }
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.services.len(), 1);
        assert!(config.services[0].replicas.is_empty());
        assert!(config.forwarding.forward_authorization);
        assert_eq!(config.identity.allowed_algorithms, vec![Algorithm::RS256]);
    }

    #[test]
    fn target_urls_lists_primary_first() {
        let service = ServiceConfig {
            name: "users".into(),
            url: "http://a:1".into(),
            replicas: vec!["http://b:1".into()],
            proxy: ProxyRule {
                prefix: "/api".into(),
                rewrite: "/users".into(),
            },
        };
        let urls: Vec<_> = service.target_urls().collect();
        assert_eq!(urls, vec!["http://a:1", "http://b:1"]);
    }
}
