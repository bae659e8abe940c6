//! Request-level failures and their HTTP mapping.
//!
//! Configuration errors abort startup and live with the code that detects them
//! (`config::loader`, `routing::router`). Everything here becomes a response.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches the request path")]
    RouteNotFound,
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend timed out")]
    BackendTimeout,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match &self {
            GatewayError::RouteNotFound => "No matching route found",
            GatewayError::Unauthorized(_) => "Unauthorized",
            GatewayError::BackendUnavailable(_) => "Upstream request failed",
            GatewayError::BackendTimeout => "Upstream request timed out",
        };
        let mut response = (self.status(), body).into_response();

        if let GatewayError::Unauthorized(err) = &self {
            let challenge = match err {
                AuthError::MissingCredential => HeaderValue::from_static("Bearer"),
                _ => HeaderValue::from_static("Bearer error=\"invalid_token\""),
            };
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
