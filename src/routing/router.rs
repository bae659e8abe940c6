//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Compile service descriptors into routes
//! - Reject unusable configurations before any traffic is served
//! - Look up the most specific route for a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); a reload
//!   builds a new table and swaps it whole
//! - O(n) scan over routes sorted longest match path first
//! - Explicit no-match rather than silent default

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::uri::PathAndQuery;

use thiserror::Error;
use url::Url;

use crate::config::ServiceConfig;
use crate::load_balancer::{LoadBalancer, RoundRobin, Target};
use crate::routing::matcher::GroupPathMatcher;
use crate::routing::rewrite::RewriteRule;

/// A service descriptor that cannot be turned into a route.
#[derive(Debug, Error)]
#[error("service '{service}': {defect}")]
pub struct ConfigurationError {
    pub service: String,
    pub defect: ConfigDefect,
}

/// The specific problem with a service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigDefect {
    #[error("unparsable base URL '{url}': {reason}")]
    UnparsableUrl { url: String, reason: String },
    #[error("unsupported scheme '{0}', only http backends are supported")]
    UnsupportedScheme(String),
    #[error("proxy prefix is empty")]
    EmptyPrefix,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("match path '{match_path}' is already owned by service '{existing}'")]
    DuplicateMatchPath { match_path: String, existing: String },
}

/// A compiled route for one service.
#[derive(Debug)]
pub struct Route {
    /// Service name for logging/metrics.
    pub name: String,
    /// Every route built from a service descriptor is protected.
    pub requires_auth: bool,
    matcher: GroupPathMatcher,
    rewrite: RewriteRule,
    targets: Vec<Target>,
    balancer: Box<dyn LoadBalancer>,
}

impl Route {
    /// The external group path (`prefix + rewrite`).
    pub fn match_path(&self) -> &str {
        self.matcher.group_path()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Pick the next backend for this route.
    pub fn select_target(&self) -> &Target {
        &self.targets[self.balancer.next_index(self.targets.len())]
    }

    /// Backend path for `path`, or `None` if this route does not own it.
    pub fn rewrite_path(&self, path: &str) -> Option<String> {
        self.matcher.matches(path).map(|m| self.rewrite.apply(m))
    }
}

/// Read-only set of routes with longest-prefix lookup.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Build the table from service descriptors.
    pub fn build(services: &[ServiceConfig]) -> Result<Self, ConfigurationError> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut routes = Vec::with_capacity(services.len());

        for service in services {
            let route = compile_route(service).map_err(|defect| ConfigurationError {
                service: service.name.clone(),
                defect,
            })?;

            if let Some(existing) = owners.get(route.match_path()) {
                return Err(ConfigurationError {
                    service: service.name.clone(),
                    defect: ConfigDefect::DuplicateMatchPath {
                        match_path: route.match_path().to_string(),
                        existing: existing.to_string(),
                    },
                });
            }
            owners.insert(route.match_path().to_string(), &service.name);

            tracing::debug!(
                service = %route.name,
                match_path = %route.match_path(),
                rewrite = %route.rewrite.rewrite(),
                targets = route.targets.len(),
                "Route compiled"
            );
            routes.push(Arc::new(route));
        }

        // Longest first; match paths are unique so the order is total
        routes.sort_by(|a, b| {
            b.match_path()
                .len()
                .cmp(&a.match_path().len())
                .then_with(|| a.match_path().cmp(b.match_path()))
        });

        Ok(Self { routes })
    }

    /// Most specific route owning `path`.
    pub fn lookup(&self, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path).is_some())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(Arc::as_ref)
    }
}

fn compile_route(service: &ServiceConfig) -> Result<Route, ConfigDefect> {
    let prefix = service.proxy.prefix.as_str();
    let rewrite = service.proxy.rewrite.as_str();

    if prefix.is_empty() {
        return Err(ConfigDefect::EmptyPrefix);
    }
    if !prefix.starts_with('/') {
        return Err(ConfigDefect::InvalidPath(format!(
            "prefix '{}' must start with '/'",
            prefix
        )));
    }
    if !rewrite.is_empty() && !rewrite.starts_with('/') {
        return Err(ConfigDefect::InvalidPath(format!(
            "rewrite '{}' must start with '/'",
            rewrite
        )));
    }

    let match_path = format!("{}{}", prefix, rewrite);
    if match_path.ends_with('/') {
        return Err(ConfigDefect::InvalidPath(format!(
            "match path '{}' must not end with '/'",
            match_path
        )));
    }
    // Backend URIs are built from these segments at request time
    if match_path.contains(['?', '#']) || PathAndQuery::from_str(&match_path).is_err() {
        return Err(ConfigDefect::InvalidPath(format!(
            "match path '{}' is not a valid URI path",
            match_path
        )));
    }

    let targets = service
        .target_urls()
        .map(parse_target)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Route {
        name: service.name.clone(),
        requires_auth: true,
        matcher: GroupPathMatcher::new(match_path),
        rewrite: RewriteRule::new(rewrite),
        targets,
        balancer: Box::new(RoundRobin::new()),
    })
}

pub(crate) fn parse_target(raw: &str) -> Result<Target, ConfigDefect> {
    let unparsable = |reason: String| ConfigDefect::UnparsableUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| unparsable(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(ConfigDefect::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(unparsable("missing host".to_string()));
    }

    Target::new(url).map_err(|e| unparsable(e.to_string()))
}
