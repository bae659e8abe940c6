//! Bearer token validation against the identity provider.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::auth::claims::{Claims, Principal};
use crate::auth::error::AuthError;
use crate::auth::jwks::KeyCache;
use crate::config::IdentityConfig;

/// Validates bearer credentials.
pub struct AuthGate {
    keys: KeyCache,
    issuer: String,
    audience: Option<String>,
    algorithms: Vec<Algorithm>,
    leeway_secs: u64,
}

impl AuthGate {
    /// `issuer` is the value tokens must carry in `iss`.
    pub fn new(keys: KeyCache, issuer: impl Into<String>, identity: &IdentityConfig) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: identity.audience.clone(),
            algorithms: identity.allowed_algorithms.clone(),
            leeway_secs: identity.leeway_secs,
        }
    }

    /// Authenticate a request from its headers.
    ///
    /// Checks run in order: credential present, token structure, signature,
    /// then issuer and time claims.
    pub async fn validate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers)?;

        let token_header = decode_header(token).map_err(|_| AuthError::MalformedCredential)?;
        if !self.algorithms.contains(&token_header.alg) {
            return Err(AuthError::MalformedCredential);
        }

        let jwk = self.keys.key_for(token_header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::InvalidSignature)?;

        let mut validation = Validation::new(token_header.alg);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &key, &validation)?;
        Ok(Principal::from(data.claims))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}
