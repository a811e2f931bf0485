// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to the GitHub REST API.
//
// Submodules:
// - types: The JSON shapes GitHub returns (profile, repositories, rate limit)
// - gateway: The Gateway trait and its error type (the finder's only view
//   of the network)
// - client: GithubClient, the reqwest-backed Gateway
// =============================================================================

mod client;
mod gateway;
mod types;

pub use client::{GithubClient, DEFAULT_API_URL};
pub use gateway::{is_full_page, Gateway, GatewayError};
pub use types::{
    format_reset_time, Profile, QuotaLevel, QuotaWindow, RateLimitStatus, RepositorySummary,
};

#[cfg(test)]
pub(crate) use gateway::RepositoryPage;
#[cfg(test)]
pub(crate) use types::fixtures;
