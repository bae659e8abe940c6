//! Route matching logic.
//!
//! # Responsibilities
//! - Match a request path against a route's group path
//! - Distinguish exact matches from sub-path matches
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matching respects segment boundaries: `/api/users` owns `/api/users`
//!   and `/api/users/...`, never `/api/usersX`
//! - No regex to guarantee O(n) matching

/// How a path relates to a group path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch<'a> {
    /// The path equals the group path.
    Exact,
    /// The path is below the group path; holds everything after `group + "/"`.
    SubPath(&'a str),
}

/// Matches the request path against a group path.
#[derive(Debug, Clone)]
pub struct GroupPathMatcher {
    group_path: String,
}

impl GroupPathMatcher {
    /// Create a new matcher for `group_path` (no trailing slash).
    pub fn new(group_path: impl Into<String>) -> Self {
        Self {
            group_path: group_path.into(),
        }
    }

    pub fn group_path(&self) -> &str {
        &self.group_path
    }

    /// Returns how `path` matches, or `None` if the route does not own it.
    pub fn matches<'a>(&self, path: &'a str) -> Option<PathMatch<'a>> {
        let rest = path.strip_prefix(self.group_path.as_str())?;
        if rest.is_empty() {
            Some(PathMatch::Exact)
        } else {
            rest.strip_prefix('/').map(PathMatch::SubPath)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = GroupPathMatcher::new("/api/tournaments");

        assert_eq!(matcher.matches("/api/tournaments"), Some(PathMatch::Exact));
        assert_eq!(
            matcher.matches("/api/tournaments/5/teams"),
            Some(PathMatch::SubPath("5/teams"))
        );
        assert_eq!(
            matcher.matches("/api/tournaments/"),
            Some(PathMatch::SubPath(""))
        );
        assert_eq!(matcher.matches("/api/tournamentsX"), None);
        assert_eq!(matcher.matches("/api"), None);
        assert_eq!(matcher.matches("/API/tournaments"), None);
    }
}
