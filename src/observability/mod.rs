//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, auth stage, key cache, route reloads
//!     → logging.rs (tracing events with request_id, route, reason fields)
//!     → metrics.rs (request, auth failure, reload and key refresh counters)
//!
//! Exposed as:
//!     → fmt subscriber on stdout, filtered by RUST_LOG or log_level
//!     → Prometheus scrape endpoint at observability.metrics_address
//! ```
//!
//! # Design Decisions
//! - The x-request-id header is the correlation key in every log line
//! - Auth failures are labelled by reason, never by token content

pub mod logging;
pub mod metrics;
