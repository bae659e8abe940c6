//! Backend target abstraction.
//!
//! # Responsibilities
//! - Represent a single backend instance of a service
//! - Build the forwarding URI for a rewritten path

use axum::http::uri::{Authority, InvalidUri, PathAndQuery, Scheme, Uri};
use std::str::FromStr;
use url::Url;

/// A single backend instance.
#[derive(Debug, Clone)]
pub struct Target {
    /// The configured base URL.
    pub base_url: Url,
    /// Host and port requests are sent to.
    pub authority: Authority,
    /// Path prefix of the base URL without a trailing slash; empty for root.
    base_path: String,
}

impl Target {
    /// Create a target from a parsed `http` base URL.
    pub fn new(base_url: Url) -> Result<Self, InvalidUri> {
        let host = base_url.host_str().unwrap_or_default();
        let authority = match base_url.port() {
            Some(port) => Authority::from_str(&format!("{}:{}", host, port))?,
            None => Authority::from_str(host)?,
        };
        let base_path = base_url.path().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            authority,
            base_path,
        })
    }

    /// Absolute URI for `path` on this target. The query string is appended untouched.
    pub fn uri_for(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let mut path_and_query = String::with_capacity(self.base_path.len() + path.len());
        path_and_query.push_str(&self.base_path);
        path_and_query.push_str(path);
        if let Some(query) = query {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::from_str(&path_and_query)?)
            .build()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.authority)
    }
}
