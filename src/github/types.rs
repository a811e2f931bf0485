// src/github/types.rs
// =============================================================================
// Data types returned by the GitHub REST API.
//
// These mirror the JSON bodies of:
// - GET /users/{handle}          -> Profile
// - GET /users/{handle}/repos    -> Vec<RepositorySummary>
// - GET /rate_limit              -> RateLimitStatus
//
// GitHub sends many more fields than we use. serde ignores unknown fields
// by default, so we only declare what the finder and the terminal need.
//
// Rust concepts:
// - Derive macros: Serialize/Deserialize generated for us by serde
// - Option<T>: For fields GitHub may send as null
// - chrono: Typed timestamps instead of raw strings
// =============================================================================

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// How many topics a repository row shows before truncating
pub const MAX_DISPLAY_TOPICS: usize = 5;

// Account metadata for one GitHub user
//
// A profile is an immutable snapshot: a new search replaces it wholesale,
// nothing ever edits one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The handle, e.g. "octocat"
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
    /// Display name
    pub name: Option<String>,
    pub company: Option<String>,
    /// Personal website
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: u32,
    pub public_gists: u32,
    pub followers: u32,
    pub following: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Name to show in headings: display name if set, otherwise the handle
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    pub avatar_url: String,
}

// One entry in a user's repository list
//
// `id` is stable across pages, which is what lets the finder refuse
// duplicates when it appends a new page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    /// Primary language as detected by GitHub
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub updated_at: DateTime<Utc>,
    /// Older API responses omit this field entirely
    #[serde(default)]
    pub topics: Vec<String>,
    pub owner: RepositoryOwner,
}

impl RepositorySummary {
    // Topics capped for display (order as GitHub sent them)
    pub fn display_topics(&self) -> &[String] {
        let end = self.topics.len().min(MAX_DISPLAY_TOPICS);
        &self.topics[..end]
    }
}

// Remaining-call budget for one resource category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaWindow {
    pub limit: u32,
    pub remaining: u32,
    /// Unix epoch seconds when the window resets
    pub reset: i64,
    pub used: u32,
}

// Coarse health of a quota window, used to colour the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLevel {
    /// More than half the budget left
    Healthy,
    /// Between 20% and 50% left
    Low,
    /// 20% or less left
    Critical,
}

impl QuotaWindow {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    // Reset time as a UTC timestamp
    //
    // Returns None if GitHub sent an out-of-range epoch value
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }

    // Percentage of the budget still available (0.0 - 100.0)
    pub fn percent_remaining(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        f64::from(self.remaining) / f64::from(self.limit) * 100.0
    }

    pub fn level(&self) -> QuotaLevel {
        let percent = self.percent_remaining();
        if percent > 50.0 {
            QuotaLevel::Healthy
        } else if percent > 20.0 {
            QuotaLevel::Low
        } else {
            QuotaLevel::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaResources {
    /// The general REST budget
    #[serde(default)]
    pub core: QuotaWindow,
    #[serde(default)]
    pub search: QuotaWindow,
    /// Structured-query (GraphQL) budget
    #[serde(default)]
    pub graphql: QuotaWindow,
}

// Body of GET /rate_limit
//
// `rate` is the overall window; it is the one the finder checks when a
// request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub resources: QuotaResources,
    pub rate: QuotaWindow,
}

// Renders a reset timestamp as local wall-clock time, e.g. "14:05:09"
pub fn format_reset_time(reset_at: &DateTime<Utc>) -> String {
    reset_at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    // Builders shared by tests in other modules
    use super::*;

    pub fn profile(login: &str) -> Profile {
        Profile {
            login: login.to_string(),
            id: 583231,
            avatar_url: format!("https://avatars.githubusercontent.com/{login}"),
            html_url: format!("https://github.com/{login}"),
            name: Some("The Octocat".to_string()),
            company: Some("@github".to_string()),
            blog: Some("https://github.blog".to_string()),
            location: Some("San Francisco".to_string()),
            email: None,
            bio: None,
            twitter_username: None,
            public_repos: 8,
            public_gists: 8,
            followers: 12000,
            following: 9,
            created_at: DateTime::from_timestamp(1_295_981_077, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        }
    }

    pub fn repository(login: &str, id: u64) -> RepositorySummary {
        RepositorySummary {
            id,
            name: format!("repo-{id}"),
            full_name: format!("{login}/repo-{id}"),
            description: Some(format!("Repository number {id}")),
            html_url: format!("https://github.com/{login}/repo-{id}"),
            language: Some("Rust".to_string()),
            stargazers_count: 10,
            forks_count: 2,
            updated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            topics: vec!["cli".to_string()],
            owner: RepositoryOwner {
                login: login.to_string(),
                avatar_url: format!("https://avatars.githubusercontent.com/{login}"),
            },
        }
    }

    pub fn rate_limit(remaining: u32, reset: i64) -> RateLimitStatus {
        let window = QuotaWindow {
            limit: 60,
            remaining,
            reset,
            used: 60 - remaining.min(60),
        };
        RateLimitStatus {
            resources: QuotaResources {
                core: window,
                search: QuotaWindow {
                    limit: 10,
                    remaining: 10,
                    reset,
                    used: 0,
                },
                graphql: QuotaWindow::default(),
            },
            rate: window,
        }
    }
}
