//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → RouteTable::build (service descriptors → routes)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server builds a new RouteTable
//!     → atomic swap of Arc<RouteTable>
//! ```
//!
//! # Design Decisions
//! - Format follows the file extension: `.yaml`/`.yml` or TOML
//! - Every section defaults, so a file listing only services is complete
//! - Service descriptors are checked when routes are compiled; the rest here
//! - Only services take effect on reload, other sections need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::CorsConfig;
pub use schema::GatewayConfig;
pub use schema::IdentityConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyRule;
pub use schema::ServiceConfig;
pub use schema::TimeoutConfig;
