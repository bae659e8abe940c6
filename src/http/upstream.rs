//! Connection-pooled client for backend calls.

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::error::GatewayError;
use crate::http::response::relay;

/// Sends requests to backends with a bounded wait for the response head.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Upstream {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: Duration::from_secs(timeouts.backend_secs),
        }
    }

    /// Send `request` (absolute URI) and relay the response.
    ///
    /// The backend timeout bounds the wait for the response head and, once
    /// streaming, each gap between body frames. Dropping the returned future
    /// cancels the backend call.
    pub async fn send(&self, request: Request<Body>) -> Result<Response, GatewayError> {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(relay(response, self.timeout)),
            Ok(Err(e)) => Err(GatewayError::BackendUnavailable(e.to_string())),
            Err(_) => Err(GatewayError::BackendTimeout),
        }
    }
}
