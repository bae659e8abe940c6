//! Ordered request stages run between route lookup and forwarding.
//!
//! # Responsibilities
//! - Authenticate requests to protected routes
//! - Normalize forwarding headers
//!
//! # Design Decisions
//! - A stage either passes the (possibly modified) request on or
//!   short-circuits with a finished response
//! - Stages see the matched route through a request extension

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use axum::response::{IntoResponse, Response};

use crate::auth::AuthGate;
use crate::error::GatewayError;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::Route;
use crate::security::headers::{set_forwarded, strip_hop_by_hop};

/// The route chosen for a request.
#[derive(Debug, Clone)]
pub struct MatchedRoute(pub Arc<Route>);

/// One step of request processing.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, request: Request<Body>) -> Result<Request<Body>, Response>;
}

/// Stages applied in insertion order.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub async fn run(&self, mut request: Request<Body>) -> Result<Request<Body>, Response> {
        for stage in &self.stages {
            request = stage.apply(request).await.inspect_err(|response| {
                tracing::debug!(
                    stage = stage.name(),
                    status = %response.status(),
                    "Request short-circuited"
                );
            })?;
        }
        Ok(request)
    }
}

/// Rejects unauthenticated requests to protected routes.
///
/// On success the [`Principal`](crate::auth::Principal) is attached as a
/// request extension.
pub struct AuthStage {
    gate: Arc<AuthGate>,
    forward_authorization: bool,
}

impl AuthStage {
    pub fn new(gate: Arc<AuthGate>, forward_authorization: bool) -> Self {
        Self {
            gate,
            forward_authorization,
        }
    }
}

#[async_trait]
impl Stage for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn apply(&self, mut request: Request<Body>) -> Result<Request<Body>, Response> {
        // Without a matched route there is nothing to exempt
        let requires_auth = request
            .extensions()
            .get::<MatchedRoute>()
            .map_or(true, |route| route.0.requires_auth);
        if !requires_auth {
            return Ok(request);
        }

        match self.gate.validate(request.headers()).await {
            Ok(principal) => {
                tracing::debug!(
                    request_id = %request_id(request.headers()),
                    subject = ?principal.subject,
                    "Request authenticated"
                );
                if !self.forward_authorization {
                    request.headers_mut().remove(header::AUTHORIZATION);
                }
                request.extensions_mut().insert(principal);
                Ok(request)
            }
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id(request.headers()),
                    path = %request.uri().path(),
                    reason = err.reason(),
                    "Request rejected"
                );
                metrics::record_auth_failure(err.reason());
                Err(GatewayError::from(err).into_response())
            }
        }
    }
}

/// Drops hop-by-hop headers and records the original client.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardedHeadersStage;

#[async_trait]
impl Stage for ForwardedHeadersStage {
    fn name(&self) -> &'static str {
        "forwarded_headers"
    }

    async fn apply(&self, mut request: Request<Body>) -> Result<Request<Body>, Response> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let host = request.headers().get(header::HOST).cloned();

        let headers = request.headers_mut();
        strip_hop_by_hop(headers);
        set_forwarded(headers, client_ip, host);
        Ok(request)
    }
}
