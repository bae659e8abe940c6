//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the route table
//! - Resolve the identity provider's key source and warm the key cache
//! - Assemble the server
//!
//! # Design Decisions
//! - Fail fast: route and discovery errors are fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::discovery::{discover, DiscoveryError};
use crate::auth::jwks::KeyFetchError;
use crate::auth::{AuthGate, HttpKeySource, KeyCache, KeySource, StaticKeySource};
use crate::config::{GatewayConfig, IdentityConfig};
use crate::http::GatewayServer;
use crate::routing::{ConfigurationError, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Routes(#[from] ConfigurationError),
    #[error("identity provider discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("could not load identity provider keys: {0}")]
    Keys(#[from] KeyFetchError),
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Build a ready-to-run server from a validated configuration.
pub async fn bootstrap(config: GatewayConfig) -> Result<GatewayServer, StartupError> {
    let routes = RouteTable::build(&config.services)?;
    for route in routes.routes() {
        tracing::info!(
            service = %route.name,
            match_path = %route.match_path(),
            targets = route.targets().len(),
            "Route registered"
        );
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeouts.discovery_secs))
        .build()
        .map_err(StartupError::Client)?;

    let (source, issuer) = key_source(client, &config.identity).await?;
    let identity = &config.identity;
    let keys = KeyCache::new(
        source,
        Duration::from_secs(identity.jwks_ttl_secs),
        Duration::from_secs(identity.min_refresh_interval_secs),
    );

    match keys.refresh().await {
        Ok(count) => tracing::info!(keys = count, "Identity provider keys loaded"),
        Err(e) => tracing::warn!(
            error = %e,
            "Could not prefetch identity provider keys, retrying on first request"
        ),
    }

    let gate = Arc::new(AuthGate::new(keys, issuer, identity));
    Ok(GatewayServer::new(config, routes, gate)?)
}

/// Key source and expected issuer: a local file, an explicit JWKS URL, or discovery.
async fn key_source(
    client: reqwest::Client,
    identity: &IdentityConfig,
) -> Result<(Arc<dyn KeySource>, String), StartupError> {
    if let Some(path) = &identity.jwks_file {
        tracing::info!(path = %path.display(), "Using identity provider keys from file");
        let source = StaticKeySource::from_file(path)?;
        return Ok((Arc::new(source), identity.issuer_url.clone()));
    }

    if let Some(url) = &identity.jwks_url {
        tracing::info!(jwks_url = %url, "Using configured JWKS endpoint");
        let source = HttpKeySource::new(client, url.clone());
        return Ok((Arc::new(source), identity.issuer_url.clone()));
    }

    let metadata = discover(&client, &identity.issuer_url).await?;
    let source = HttpKeySource::new(client, metadata.jwks_uri);
    Ok((Arc::new(source), metadata.issuer))
}
