// src/github/gateway.rs
// =============================================================================
// The contract between the finder and the network.
//
// The finder never talks to reqwest directly. It only sees the `Gateway`
// trait below, which has three calls:
// - fetch_profile        (GET /users/{handle})
// - fetch_repositories   (GET /users/{handle}/repos?page=..&per_page=..)
// - fetch_quota_status   (GET /rate_limit)
//
// None of them panic or leak transport details: every failure comes back
// as a `GatewayError` whose Display text is already fit to show a user.
//
// Rust concepts:
// - Traits: The seam that lets tests swap in a fake gateway
// - async-trait: Async methods on a trait object
// - thiserror: Deriving std::error::Error for an enum
// =============================================================================

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Profile, RateLimitStatus, RepositorySummary};

// What each request was trying to do, used as the error message prefix
pub const PROFILE_REQUEST: &str = "Failed to fetch user data";
pub const REPOSITORIES_REQUEST: &str = "Failed to fetch repositories";
pub const QUOTA_REQUEST: &str = "Failed to check rate limit";

// Everything that can go wrong talking to GitHub
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The handle does not exist (HTTP 404 on the profile endpoint)
    #[error("User not found")]
    NotFound,

    /// GitHub answered with a non-success status
    #[error("{what} (HTTP {status})")]
    Status { what: &'static str, status: u16 },

    /// The request never completed, or the body was not the JSON we expected
    #[error("{what}: {source}")]
    Transport {
        what: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

// One page of repositories plus the "more pages likely" hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPage {
    pub repositories: Vec<RepositorySummary>,
    pub has_more: bool,
}

impl RepositoryPage {
    // A page that came back exactly full means there is probably another one
    pub fn new(repositories: Vec<RepositorySummary>, page_size: u32) -> Self {
        let has_more = is_full_page(repositories.len(), page_size);
        Self {
            repositories,
            has_more,
        }
    }
}

// Shared by the gateway and by cached pages, which only store the items
pub fn is_full_page(len: usize, page_size: u32) -> bool {
    u32::try_from(len).is_ok_and(|len| len == page_size)
}

// The only way the finder touches the network
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_profile(&self, handle: &str) -> Result<Profile, GatewayError>;

    // `page` is 1-based
    async fn fetch_repositories(
        &self,
        handle: &str,
        page: u32,
        page_size: u32,
    ) -> Result<RepositoryPage, GatewayError>;

    async fn fetch_quota_status(&self) -> Result<RateLimitStatus, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::fixtures;

    #[test]
    fn test_full_page_means_more() {
        let repos: Vec<_> = (1..=10).map(|id| fixtures::repository("octocat", id)).collect();
        assert!(RepositoryPage::new(repos, 10).has_more);
    }

    #[test]
    fn test_short_page_means_exhausted() {
        let repos: Vec<_> = (1..=3).map(|id| fixtures::repository("octocat", id)).collect();
        assert!(!RepositoryPage::new(repos, 10).has_more);
        assert!(!RepositoryPage::new(Vec::new(), 10).has_more);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(GatewayError::NotFound.to_string(), "User not found");
        let err = GatewayError::Status {
            what: REPOSITORIES_REQUEST,
            status: 500,
        };
        assert_eq!(err.to_string(), "Failed to fetch repositories (HTTP 500)");
    }
}
