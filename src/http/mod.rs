//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, request ID, tracing)
//!     → /health, /api/register answered directly
//!     → proxy.rs (route lookup, dispatch)
//!     → pipeline.rs (authentication, forwarding headers)
//!     → upstream.rs (pooled backend client, timeout)
//!     → response.rs (relay, strip hop-by-hop headers)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod proxy;
pub mod registration;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use pipeline::{AuthStage, ForwardedHeadersStage, MatchedRoute, Pipeline, Stage};
pub use registration::{RegistrationHandler, UpstreamRegistration};
pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};
pub use upstream::Upstream;
