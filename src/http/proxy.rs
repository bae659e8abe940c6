//! Request dispatch to backend services.
//!
//! # Data Flow
//! ```text
//! Request
//!     → RouteTable::lookup (404 when nothing owns the path)
//!     → Pipeline (auth, forwarding headers)
//!     → Route::select_target + Route::rewrite_path
//!     → Upstream::send (502 on failure, 504 on timeout)
//!     → backend response relayed unchanged
//! ```

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Version},
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::http::pipeline::MatchedRoute;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::load_balancer::Target;
use crate::observability::metrics;

/// Fallback handler: everything not served by the gateway itself.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let Some(route) = state.routes.load().lookup(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return GatewayError::RouteNotFound.into_response();
    };

    let mut request = request;
    request
        .extensions_mut()
        .insert(MatchedRoute(route.clone()));

    let request = match state.pipeline.run(request).await {
        Ok(request) => request,
        Err(response) => {
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                &route.name,
                start_time,
            );
            return response;
        }
    };

    let target = route.select_target();
    let result = match route.rewrite_path(&path) {
        Some(backend_path) => match to_backend(request, target, &backend_path) {
            Ok(request) => state.upstream.send(request).await,
            Err(err) => Err(err),
        },
        // lookup only returns routes that own the path
        None => Err(GatewayError::RouteNotFound),
    };

    match result {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                route = %route.name,
                target = %target,
                status = %response.status(),
                "Backend responded"
            );
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                &route.name,
                start_time,
            );
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name,
                target = %target,
                error = %err,
                "Upstream error"
            );
            metrics::record_request(
                method.as_str(),
                err.status().as_u16(),
                &route.name,
                start_time,
            );
            err.into_response()
        }
    }
}

/// Re-target `request` at `target`, keeping method, headers, query and body.
fn to_backend(
    request: Request<Body>,
    target: &Target,
    backend_path: &str,
) -> Result<Request<Body>, GatewayError> {
    let (mut parts, body) = request.into_parts();
    parts.uri = target
        .uri_for(backend_path, parts.uri.query())
        .map_err(|e| GatewayError::BackendUnavailable(e.to_string()))?;
    // The client sets Host from the URI authority; the original is in X-Forwarded-Host
    parts.headers.remove(header::HOST);
    parts.version = Version::HTTP_11;
    Ok(Request::from_parts(parts, body))
}
