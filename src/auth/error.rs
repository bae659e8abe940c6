//! Credential validation failures.

use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Why a request's credential was rejected. Every variant yields 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("malformed bearer credential")]
    MalformedCredential,
    #[error("credential has expired")]
    ExpiredCredential,
    #[error("credential is not yet valid")]
    NotYetValid,
    #[error("credential signature is invalid")]
    InvalidSignature,
    #[error("credential issuer does not match the identity provider")]
    IssuerMismatch,
    #[error("credential audience does not match")]
    AudienceMismatch,
    #[error("identity provider keys are unavailable")]
    KeysUnavailable,
}

impl AuthError {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::MalformedCredential => "malformed",
            AuthError::ExpiredCredential => "expired",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::KeysUnavailable => "keys_unavailable",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
            ErrorKind::ImmatureSignature => AuthError::NotYetValid,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::IssuerMismatch,
            ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
            _ => AuthError::MalformedCredential,
        }
    }
}
