// src/finder/state.rs
// =============================================================================
// The finder's state, as an explicit state machine.
//
// Phases:
//   Idle            nothing searched yet (or the search was cleared)
//   LoadingInitial  profile + first page are being fetched
//   Ready           a subject is loaded; more pages may be requested
//   LoadingMore     a subject is loaded and the next page is in flight
//   Failed          the profile lookup failed; only the handle is known
//
// The error message lives next to the phase, not inside it, because it is
// orthogonal: a Ready subject can carry an error (repositories failed after
// the profile loaded), and dismissing the error must not touch the subject.
//
// "Loading more without a subject" cannot be written down: LoadingMore
// holds the Subject itself.
// =============================================================================

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::error::SearchError;
use crate::github::{is_full_page, Profile, RepositorySummary};

// Where pagination stands for the current subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Last page that was appended (1-based)
    pub page: u32,
    /// True while the last page came back full
    pub has_more: bool,
}

impl Cursor {
    pub fn after_page(page: u32, len: usize, page_size: u32) -> Self {
        Self {
            page,
            has_more: is_full_page(len, page_size),
        }
    }
}

// The user being browsed: handle, profile and the repositories seen so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub handle: String,
    pub profile: Profile,
    /// Append-only, most recently updated first
    pub repositories: Vec<RepositorySummary>,
    pub cursor: Cursor,
}

impl Subject {
    pub fn first_page(
        handle: String,
        profile: Profile,
        repositories: Vec<RepositorySummary>,
        page_size: u32,
    ) -> Self {
        let cursor = Cursor::after_page(1, repositories.len(), page_size);
        Self {
            handle,
            profile,
            repositories,
            cursor,
        }
    }

    // Profile without repositories, used when the first page failed
    pub fn without_repositories(handle: String, profile: Profile) -> Self {
        Self {
            handle,
            profile,
            repositories: Vec::new(),
            cursor: Cursor {
                page: 1,
                has_more: false,
            },
        }
    }

    // Appends `page`, which must be the one right after the cursor
    //
    // Repositories whose id is already listed are dropped: GitHub pages by
    // "last updated", so a push between two requests can shift an item
    // onto the next page a second time.
    pub fn append_page(&mut self, page: u32, repositories: Vec<RepositorySummary>, page_size: u32) {
        let fetched = repositories.len();
        let seen: HashSet<u64> = self.repositories.iter().map(|repo| repo.id).collect();
        let before = self.repositories.len();
        self.repositories
            .extend(repositories.into_iter().filter(|repo| !seen.contains(&repo.id)));

        let skipped = fetched - (self.repositories.len() - before);
        if skipped > 0 {
            debug!(handle = %self.handle, page, skipped, "dropped repositories already listed");
        }
        self.cursor = Cursor::after_page(page, fetched, page_size);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    LoadingInitial {
        handle: String,
    },
    Ready(Subject),
    LoadingMore(Subject),
    Failed {
        handle: String,
    },
}

// Everything the front end reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub(super) phase: Phase,
    pub(super) error: Option<SearchError>,
}

impl SearchState {
    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        match &self.phase {
            Phase::Ready(subject) | Phase::LoadingMore(subject) => Some(subject),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.subject().map(|subject| &subject.profile)
    }

    pub fn repositories(&self) -> &[RepositorySummary] {
        self.subject()
            .map(|subject| subject.repositories.as_slice())
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::LoadingInitial { .. } | Phase::LoadingMore(_)
        )
    }

    // Empty string when nothing has been searched
    pub fn searched_handle(&self) -> &str {
        match &self.phase {
            Phase::Idle => "",
            Phase::LoadingInitial { handle } | Phase::Failed { handle } => handle,
            Phase::Ready(subject) | Phase::LoadingMore(subject) => &subject.handle,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.subject().map_or(1, |subject| subject.cursor.page)
    }

    pub fn has_more_repos(&self) -> bool {
        self.subject().is_some_and(|subject| subject.cursor.has_more)
    }

    pub fn view(&self) -> StateView {
        StateView {
            profile: self.profile().cloned(),
            repositories: self.repositories().to_vec(),
            loading: self.is_loading(),
            error: self.error.as_ref().map(ToString::to_string),
            searched_handle: self.searched_handle().to_string(),
            current_page: self.current_page(),
            has_more_repos: self.has_more_repos(),
        }
    }
}

// Flat, serialisable projection of SearchState (what --json prints)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateView {
    pub profile: Option<Profile>,
    pub repositories: Vec<RepositorySummary>,
    pub loading: bool,
    pub error: Option<String>,
    pub searched_handle: String,
    pub current_page: u32,
    pub has_more_repos: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fixtures;

    fn repos(ids: std::ops::RangeInclusive<u64>) -> Vec<RepositorySummary> {
        ids.map(|id| fixtures::repository("octocat", id)).collect()
    }

    #[test]
    fn test_idle_view() {
        let view = SearchState::default().view();
        assert_eq!(view.searched_handle, "");
        assert_eq!(view.current_page, 1);
        assert!(!view.loading);
        assert!(!view.has_more_repos);
        assert!(view.profile.is_none());
    }

    #[test]
    fn test_first_page_cursor() {
        let full = Subject::first_page("octocat".into(), fixtures::profile("octocat"), repos(1..=10), 10);
        assert_eq!(full.cursor, Cursor { page: 1, has_more: true });

        let short = Subject::first_page("octocat".into(), fixtures::profile("octocat"), repos(1..=4), 10);
        assert_eq!(short.cursor, Cursor { page: 1, has_more: false });
    }

    #[test]
    fn test_append_page_skips_duplicates() {
        let mut subject =
            Subject::first_page("octocat".into(), fixtures::profile("octocat"), repos(1..=10), 10);
        subject.append_page(2, repos(10..=19), 10);

        let ids: Vec<u64> = subject.repositories.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=19).collect::<Vec<_>>());
        // the page itself was full, so more are still expected
        assert_eq!(subject.cursor, Cursor { page: 2, has_more: true });
    }

    #[test]
    fn test_page_of_only_duplicates_still_advances() {
        let mut subject =
            Subject::first_page("octocat".into(), fixtures::profile("octocat"), repos(1..=10), 10);
        subject.append_page(2, repos(1..=10), 10);

        assert_eq!(subject.repositories.len(), 10);
        assert_eq!(subject.cursor, Cursor { page: 2, has_more: true });
    }

    #[test]
    fn test_loading_more_keeps_subject_visible() {
        let subject = Subject::first_page("octocat".into(), fixtures::profile("octocat"), repos(1..=10), 10);
        let state = SearchState {
            phase: Phase::LoadingMore(subject),
            error: None,
        };
        assert!(state.is_loading());
        assert_eq!(state.repositories().len(), 10);
        assert_eq!(state.searched_handle(), "octocat");
    }

    #[test]
    fn test_view_renders_error_text() {
        let state = SearchState {
            phase: Phase::Failed {
                handle: "ghost".into(),
            },
            error: Some(SearchError::NotFound),
        };
        let view = state.view();
        assert_eq!(view.error.as_deref(), Some("User not found"));
        assert_eq!(view.searched_handle, "ghost");
        assert!(view.repositories.is_empty());
    }
}
