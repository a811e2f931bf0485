// src/github/client.rs
// =============================================================================
// The real gateway: talks to the GitHub REST API over HTTPS.
//
// Strategy:
// - One reqwest Client, built once, reused for every request (pooling)
// - GitHub rejects requests without a User-Agent, so we always send one
// - Endpoints are built from a configurable base URL so tests and
//   GitHub Enterprise hosts can point elsewhere
// - Unauthenticated only: 60 requests/hour, which is why the finder
//   checks the rate limit whenever something fails
//
// Rust concepts:
// - impl Trait for Struct: Plugging GithubClient into the Gateway trait
// - url::Url: Building paths without hand-escaping user input
// =============================================================================

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::gateway::{
    Gateway, GatewayError, RepositoryPage, PROFILE_REQUEST, QUOTA_REQUEST, REPOSITORIES_REQUEST,
};
use super::types::{Profile, RateLimitStatus, RepositorySummary};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("github-user-finder/", env!("CARGO_PKG_VERSION"));

// HTTP-backed implementation of the Gateway trait
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base: Url,
}

impl GithubClient {
    // Creates a client for the API rooted at `base`
    //
    // Fails if the URL cannot carry a path (e.g. "mailto:...") or if the
    // TLS backend cannot be initialised.
    pub fn new(base: Url) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(anyhow!("API URL cannot be used as a base: {base}"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base })
    }

    // Appends path segments to the base URL
    //
    // Each segment is percent-encoded by `url`, so a handle like "a/b"
    // cannot escape into another endpoint.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // new() rejected cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // Sends a GET and decodes the JSON body
    //
    // `what` becomes the prefix of any error message. A 404 is reported as
    // NotFound only when `not_found_is_distinct` is set (profile lookups).
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &'static str,
        not_found_is_distinct: bool,
    ) -> Result<T, GatewayError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { what, source })?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "response");
        if let Some(err) = classify_status(status, what, not_found_is_distinct) {
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|source| GatewayError::Transport { what, source })
    }
}

// Maps an HTTP status to a gateway error (None means success)
fn classify_status(
    status: StatusCode,
    what: &'static str,
    not_found_is_distinct: bool,
) -> Option<GatewayError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND && not_found_is_distinct {
        Some(GatewayError::NotFound)
    } else {
        Some(GatewayError::Status {
            what,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Gateway for GithubClient {
    async fn fetch_profile(&self, handle: &str) -> Result<Profile, GatewayError> {
        let url = self.endpoint(&["users", handle]);
        self.get_json(url, &[], PROFILE_REQUEST, true).await
    }

    async fn fetch_repositories(
        &self,
        handle: &str,
        page: u32,
        page_size: u32,
    ) -> Result<RepositoryPage, GatewayError> {
        let url = self.endpoint(&["users", handle, "repos"]);
        // Most recently updated first, so page order is stable for a session
        let query = [
            ("page", page.to_string()),
            ("per_page", page_size.to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        let repositories: Vec<RepositorySummary> =
            self.get_json(url, &query, REPOSITORIES_REQUEST, false).await?;
        Ok(RepositoryPage::new(repositories, page_size))
    }

    async fn fetch_quota_status(&self) -> Result<RateLimitStatus, GatewayError> {
        let url = self.endpoint(&["rate_limit"]);
        self.get_json(url, &[], QUOTA_REQUEST, false).await
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait (Gateway) and a struct (GithubClient)?
//    - The finder is written against the trait, not the struct
//    - Production code passes a GithubClient
//    - Tests pass a fake that returns canned data, so no network is needed
//
// 2. What does #[async_trait] do?
//    - It rewrites `async fn` in traits into methods returning boxed futures
//    - That makes the trait usable as `dyn Gateway` and keeps futures Send
//
// 3. Why map_err instead of the ? operator alone?
//    - reqwest::Error does not know which request failed
//    - map_err wraps it together with a human-readable "what"
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GithubClient {
        GithubClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_from_root() {
        let c = client("https://api.github.com");
        assert_eq!(
            c.endpoint(&["users", "octocat", "repos"]).as_str(),
            "https://api.github.com/users/octocat/repos"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("https://ghe.example.com/api/v3/");
        assert_eq!(
            c.endpoint(&["rate_limit"]).as_str(),
            "https://ghe.example.com/api/v3/rate_limit"
        );
    }

    #[test]
    fn test_endpoint_escapes_handle() {
        let c = client("https://api.github.com");
        let url = c.endpoint(&["users", "../rate_limit"]);
        assert_eq!(url.path(), "/users/..%2Frate_limit");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = GithubClient::new(Url::parse("mailto:someone@example.com").unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK, PROFILE_REQUEST, true).is_none());
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, PROFILE_REQUEST, true),
            Some(GatewayError::NotFound)
        ));
        // repository listing reports 404 as a plain status failure
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, REPOSITORIES_REQUEST, false),
            Some(GatewayError::Status { status: 404, .. })
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, PROFILE_REQUEST, true),
            Some(GatewayError::Status { status: 403, .. })
        ));
    }
}
