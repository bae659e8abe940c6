//! Unauthenticated user registration.
//!
//! `/api/register` is answered by a collaborator instead of the route
//! table, so new users can sign up before they hold a token.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Version};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::http::pipeline::{ForwardedHeadersStage, Stage};
use crate::http::request::request_id;
use crate::http::upstream::Upstream;
use crate::load_balancer::Target;
use crate::routing::router::parse_target;
use crate::routing::ConfigurationError;

/// Handles registration requests.
#[async_trait]
pub trait RegistrationHandler: Send + Sync {
    async fn handle(&self, request: Request<Body>) -> Response;
}

/// Relays registration requests verbatim to a user service.
pub struct UpstreamRegistration {
    target: Target,
    upstream: Upstream,
}

impl UpstreamRegistration {
    pub fn new(url: &str, upstream: Upstream) -> Result<Self, ConfigurationError> {
        let target = parse_target(url).map_err(|defect| ConfigurationError {
            service: "registration".to_string(),
            defect,
        })?;
        Ok(Self { target, upstream })
    }

    async fn relay(&self, request: Request<Body>) -> Result<Response, GatewayError> {
        let request = match ForwardedHeadersStage.apply(request).await {
            Ok(request) => request,
            Err(response) => return Ok(response),
        };

        let (mut parts, body) = request.into_parts();
        parts.uri = self
            .target
            .uri_for(parts.uri.path(), parts.uri.query())
            .map_err(|e| GatewayError::BackendUnavailable(e.to_string()))?;
        parts.headers.remove(header::HOST);
        parts.version = Version::HTTP_11;

        self.upstream.send(Request::from_parts(parts, body)).await
    }
}

#[async_trait]
impl RegistrationHandler for UpstreamRegistration {
    async fn handle(&self, request: Request<Body>) -> Response {
        let request_id = request_id(request.headers()).to_string();

        match self.relay(request).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    target = %self.target,
                    status = %response.status(),
                    "Registration relayed"
                );
                response
            }
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    target = %self.target,
                    error = %err,
                    "Registration failed"
                );
                err.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::routing::ConfigDefect;

    #[test]
    fn rejects_https_user_service() {
        let err = UpstreamRegistration::new(
            "https://users.internal",
            Upstream::new(&TimeoutConfig::default()),
        )
        .err()
        .unwrap();
        assert_eq!(err.service, "registration");
        assert_eq!(err.defect, ConfigDefect::UnsupportedScheme("https".into()));
    }
}
