//! Path rewriting from the external group path to the backend path.

use crate::routing::matcher::PathMatch;

/// Maps a matched request path onto the backend's path prefix.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    rewrite: String,
}

impl RewriteRule {
    pub fn new(rewrite: impl Into<String>) -> Self {
        Self {
            rewrite: rewrite.into(),
        }
    }

    /// The backend path prefix.
    pub fn rewrite(&self) -> &str {
        &self.rewrite
    }

    /// Backend path for a match. The suffix is kept byte-for-byte.
    pub fn apply(&self, matched: PathMatch<'_>) -> String {
        match matched {
            PathMatch::Exact if self.rewrite.is_empty() => "/".to_string(),
            PathMatch::Exact => self.rewrite.clone(),
            PathMatch::SubPath(suffix) => {
                let mut path = String::with_capacity(self.rewrite.len() + 1 + suffix.len());
                path.push_str(&self.rewrite);
                path.push('/');
                path.push_str(suffix);
                path
            }
        }
    }
}
