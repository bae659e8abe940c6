//! Validated identity extracted from a bearer token.

use serde::Deserialize;

/// Claims the gateway reads from an access token.
#[derive(Debug, Deserialize)]
pub(crate) struct Claims {
    #[serde(default)]
    sub: Option<String>,
    iss: String,
    exp: u64,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    realm_access: Option<RealmAccess>,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// The authenticated caller, attached to the request after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<String>,
    pub issuer: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: u64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            issuer: claims.iss,
            username: claims.preferred_username,
            email: claims.email,
            roles: claims.realm_access.unwrap_or_default().roles,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_keycloak_claims() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "3f1c",
            "iss": "https://id.example/realms/hub",
            "exp": 1_900_000_000u64,
            "preferred_username": "ada",
            "realm_access": { "roles": ["player", "organizer"] }
        }))
        .unwrap();

        let principal = Principal::from(claims);
        assert_eq!(principal.subject.as_deref(), Some("3f1c"));
        assert_eq!(principal.username.as_deref(), Some("ada"));
        assert_eq!(principal.roles, vec!["player", "organizer"]);
        assert_eq!(principal.email, None);
    }
}
