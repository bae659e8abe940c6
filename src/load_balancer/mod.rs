//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → route owns its targets and balancer
//!     → round_robin.rs (rotate through targets)
//!     → backend.rs (target → forwarding URI)
//! ```
//!
//! # Design Decisions
//! - One balancer per route; the cursor is the only shared mutable state
//! - Balancers pick an index, targets stay owned by the route
//! - An empty target set is rejected when the route table is built

pub mod backend;
pub mod round_robin;

pub use backend::Target;
pub use round_robin::RoundRobin;

/// Target selection policy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Index of the next target among `len` targets. `len` is never zero.
    fn next_index(&self, len: usize) -> usize;
}
