//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//! Response to client:
//!     → headers.rs (strip hop-by-hop)
//! ```
//!
//! Credential checks live in `auth`; CORS is a router layer.

pub mod headers;
