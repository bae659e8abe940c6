//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     discovery.rs (issuer → jwks_uri)
//!     → jwks.rs (KeyCache over an HttpKeySource or StaticKeySource)
//!     → gate.rs (AuthGate bound to the issuer)
//!
//! Per request:
//!     Authorization header
//!     → gate.rs (bearer extraction, header + signature check, claim check)
//!     → jwks.rs (cached key lookup, refresh on miss)
//!     → claims.rs (Principal) or error.rs (AuthError → 401)
//! ```
//!
//! # Design Decisions
//! - Tokens are validated, never issued
//! - Key refresh is the only suspension point and is shared process-wide
//! - Every failure rejects the request; nothing is forwarded unauthenticated

pub mod claims;
pub mod discovery;
pub mod error;
pub mod gate;
pub mod jwks;

pub use claims::Principal;
pub use error::AuthError;
pub use gate::AuthGate;
pub use jwks::{HttpKeySource, KeyCache, KeySource, StaticKeySource};
