//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log filter from the environment or configuration
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `log_level` applies to this crate and tower-http.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(log_level: &str) -> String {
    format!("api_gateway={level},tower_http={level}", level = log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_targets_gateway_and_tower_http() {
        let filter = default_filter("debug");
        assert_eq!(filter, "api_gateway=debug,tower_http=debug");
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
