//! API gateway library: authenticated path-based routing to backend services.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::{bootstrap, Shutdown};
pub use routing::RouteTable;
