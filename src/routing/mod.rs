//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (longest-prefix route lookup)
//!     → matcher.rs (exact or sub-path match against the group path)
//!     → rewrite.rs (external path → backend path)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     ServiceConfig[]
//!     → Validate prefix/rewrite, parse target URLs
//!     → Reject duplicate match paths
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Most specific match path wins; configuration order does not matter

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use router::{ConfigDefect, ConfigurationError, Route, RouteTable};
