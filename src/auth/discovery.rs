//! OpenID Connect provider discovery.

use serde::Deserialize;
use thiserror::Error;

/// The subset of provider metadata the gateway needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub jwks_uri: String,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider advertises issuer '{advertised}', expected '{expected}'")]
    IssuerMismatch { expected: String, advertised: String },
}

/// Fetch `{issuer_url}/.well-known/openid-configuration`.
pub async fn discover(
    client: &reqwest::Client,
    issuer_url: &str,
) -> Result<ProviderMetadata, DiscoveryError> {
    let issuer_url = issuer_url.trim_end_matches('/');
    let well_known = format!("{}/.well-known/openid-configuration", issuer_url);

    let metadata: ProviderMetadata = client
        .get(&well_known)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if metadata.issuer.trim_end_matches('/') != issuer_url {
        return Err(DiscoveryError::IssuerMismatch {
            expected: issuer_url.to_string(),
            advertised: metadata.issuer,
        });
    }

    tracing::info!(
        issuer = %metadata.issuer,
        jwks_uri = %metadata.jwks_uri,
        "Identity provider discovered"
    );
    Ok(metadata)
}
