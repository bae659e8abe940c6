//! Response relay from backend to client.
//!
//! # Responsibilities
//! - Hand the backend's status, headers and body back unchanged
//! - Strip hop-by-hop headers
//! - Bound how long the body may stall between frames
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - A stalled body ends with an error, which aborts the client connection

use std::time::Duration;

use axum::body::Body;
use axum::response::Response;
use hyper::body::Incoming;
use tower_http::timeout::TimeoutBody;

use crate::security::headers::strip_hop_by_hop;

/// Convert a backend response into a client response.
///
/// Each body frame must arrive within `idle_timeout` of the previous one.
pub fn relay(response: hyper::Response<Incoming>, idle_timeout: Duration) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(TimeoutBody::new(idle_timeout, body)))
}
