// src/finder/error.rs
// =============================================================================
// The errors a user can see after a search or a page load.
//
// Kinds:
// - EmptyHandle: nothing to search for (checked locally, no network)
// - NotFound: GitHub has no such user
// - QuotaExceeded: a request failed and the rate limit is used up
// - Fetch: any other network or decoding failure, message passed through
//
// "Profile loaded but repositories failed" is not its own kind: it shows
// up as a Ready state that still carries one of the errors above.
// =============================================================================

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::github::{format_reset_time, GatewayError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a username")]
    EmptyHandle,

    #[error("User not found")]
    NotFound,

    #[error(
        "Rate limit exceeded. Resets at {}. Try again later.",
        format_reset_time(.reset_at)
    )]
    QuotaExceeded { reset_at: DateTime<Utc> },

    #[error("{0}")]
    Fetch(String),
}

impl From<&GatewayError> for SearchError {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::NotFound => SearchError::NotFound,
            other => SearchError::Fetch(other.to_string()),
        }
    }
}
