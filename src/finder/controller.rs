// src/finder/controller.rs
// =============================================================================
// The Finder: looks a user up, then pages through their repositories.
//
// What it coordinates:
// 1. search(handle): cache check -> profile -> first page -> cache write
// 2. load_more(): next page from the cache, or from GitHub on a miss
// 3. Error translation: when a request fails, ask GitHub for the rate
//    limit; if it is used up, say so (with the reset time) instead of
//    the raw error
//
// Concurrency:
// - All methods take &self, so one Finder can sit in an Arc and be driven
//   from spawned tasks (the scroll trigger does exactly that)
// - State lives in a tokio watch channel: readers take snapshots or
//   subscribe to changes, and every update is a single atomic closure
// - load_more() claims the next page inside such a closure, so two callers
//   can never fetch or append the same page twice
// - There is no cancellation: a newer search simply overwrites the state,
//   and a page that arrives for a subject that is gone is thrown away
// =============================================================================

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::error::SearchError;
use super::state::{Phase, SearchState, Subject};
use crate::cache::{profile_key, repos_key, Cache};
use crate::github::{Gateway, GatewayError, Profile, RepositorySummary};

// Repositories per page, for both the first page and every later one
pub const PAGE_SIZE: u32 = 10;

// Why a load_more() fetch did not produce a page
enum PageError {
    /// Someone else changed the state between the guard and the claim
    Superseded,
    Gateway(GatewayError),
}

pub struct Finder<G> {
    gateway: G,
    cache: Cache,
    state: watch::Sender<SearchState>,
}

impl<G: Gateway> Finder<G> {
    pub fn new(gateway: G, cache: Cache) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            gateway,
            cache,
            state,
        }
    }

    // Snapshot of the current state
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    // Receiver that wakes up on every state change
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    // Looks up `input` (trimmed) and loads the first page of repositories
    //
    // Blank input only sets a validation error; nothing else changes and
    // no request is made.
    pub async fn search(&self, input: &str) {
        let handle = input.trim();
        if handle.is_empty() {
            debug!("rejected blank search");
            self.state
                .send_modify(|state| state.error = Some(SearchError::EmptyHandle));
            return;
        }
        let handle = handle.to_string();

        // Both entries or neither: a cached profile next to a missing or
        // stale first page would show a mismatched pair
        let cached_profile = self.cache.get::<Profile>(&profile_key(&handle));
        let cached_first_page = self
            .cache
            .get::<Vec<RepositorySummary>>(&repos_key(&handle, 1));
        if let (Some(profile), Some(repositories)) = (cached_profile, cached_first_page) {
            info!(handle = %handle, "search served from cache");
            let subject = Subject::first_page(handle, profile, repositories, PAGE_SIZE);
            self.set_state(Phase::Ready(subject), None);
            return;
        }

        info!(handle = %handle, "searching");
        self.set_state(
            Phase::LoadingInitial {
                handle: handle.clone(),
            },
            None,
        );

        let profile = match self.gateway.fetch_profile(&handle).await {
            Ok(profile) => profile,
            Err(err) => {
                let error = self.explain(&err).await;
                warn!(handle = %handle, error = %error, "profile lookup failed");
                self.set_state(Phase::Failed { handle }, Some(error));
                return;
            }
        };

        let page = match self.gateway.fetch_repositories(&handle, 1, PAGE_SIZE).await {
            Ok(page) => page,
            Err(err) => {
                let error = self.explain(&err).await;
                warn!(handle = %handle, error = %error, "first page failed; keeping the profile");
                let subject = Subject::without_repositories(handle, profile);
                self.set_state(Phase::Ready(subject), Some(error));
                return;
            }
        };

        self.cache.set(&profile_key(&handle), &profile);
        self.cache.set(&repos_key(&handle, 1), &page.repositories);

        let subject = Subject::first_page(handle, profile, page.repositories, PAGE_SIZE);
        debug!(
            handle = %subject.handle,
            repositories = subject.repositories.len(),
            has_more = subject.cursor.has_more,
            "search finished"
        );
        self.set_state(Phase::Ready(subject), None);
    }

    // Appends the next page of repositories
    //
    // Does nothing without a loaded subject, while another load is in
    // flight, or once the last page came back short. A failed page keeps
    // what is already shown and stops further paging.
    pub async fn load_more(&self) {
        let Some((handle, page)) = self.next_page() else {
            debug!("load_more ignored");
            return;
        };

        let key = repos_key(&handle, page);
        let handle_ref = handle.as_str();
        let fetch = move || async move {
            if !self.begin_loading_more(handle_ref, page) {
                return Err(PageError::Superseded);
            }
            debug!(handle = handle_ref, page, "fetching page");
            self.gateway
                .fetch_repositories(handle_ref, page, PAGE_SIZE)
                .await
                .map(|fetched| {
                    trace!(handle = handle_ref, page, has_more = fetched.has_more, "page fetched");
                    fetched.repositories
                })
                .map_err(PageError::Gateway)
        };

        match self.cache.read_through(&key, fetch).await {
            Ok(lookup) => {
                let from_cache = lookup.is_hit();
                let repositories = lookup.into_inner();
                debug!(handle = %handle, page, from_cache, count = repositories.len(), "page loaded");
                self.append_page(&handle, page, repositories);
            }
            Err(PageError::Superseded) => {
                debug!(handle = %handle, page, "page claimed elsewhere");
            }
            Err(PageError::Gateway(err)) => {
                warn!(handle = %handle, page, error = %err, "page failed; no more pages will be requested");
                self.stop_paging(&handle, page);
            }
        }
    }

    // Back to the initial empty state; cached entries stay until they expire
    pub fn clear_search(&self) {
        debug!("search cleared");
        self.state.send_replace(SearchState::default());
    }

    // Dismisses the error and keeps whatever was loaded
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn set_state(&self, phase: Phase, error: Option<SearchError>) {
        self.state.send_replace(SearchState { phase, error });
    }

    // (handle, page) of the page load_more() should fetch, if any
    fn next_page(&self) -> Option<(String, u32)> {
        match &self.state.borrow().phase {
            Phase::Ready(subject) if subject.cursor.has_more => {
                Some((subject.handle.clone(), subject.cursor.page + 1))
            }
            _ => None,
        }
    }

    // Ready -> LoadingMore, only if `page` is still the next page of `handle`
    fn begin_loading_more(&self, handle: &str, page: u32) -> bool {
        self.state.send_if_modified(|state| {
            match std::mem::take(&mut state.phase) {
                Phase::Ready(subject) if is_next_page(&subject, handle, page) => {
                    state.phase = Phase::LoadingMore(subject);
                    true
                }
                other => {
                    state.phase = other;
                    false
                }
            }
        })
    }

    fn append_page(&self, handle: &str, page: u32, repositories: Vec<RepositorySummary>) {
        let applied = self.state.send_if_modified(|state| {
            match std::mem::take(&mut state.phase) {
                Phase::Ready(mut subject) | Phase::LoadingMore(mut subject)
                    if is_next_page(&subject, handle, page) =>
                {
                    subject.append_page(page, repositories, PAGE_SIZE);
                    state.phase = Phase::Ready(subject);
                    true
                }
                other => {
                    state.phase = other;
                    false
                }
            }
        });
        if !applied {
            debug!(handle, page, "discarded page for a subject that is gone");
        }
    }

    fn stop_paging(&self, handle: &str, page: u32) {
        self.state.send_if_modified(|state| {
            match std::mem::take(&mut state.phase) {
                Phase::LoadingMore(mut subject) if is_next_page(&subject, handle, page) => {
                    subject.cursor.has_more = false;
                    state.phase = Phase::Ready(subject);
                    true
                }
                other => {
                    state.phase = other;
                    false
                }
            }
        });
    }

    // Turns a failed request into the error the user sees
    //
    // If the rate limit is exhausted the message says when it resets.
    // A failing rate-limit check never hides the original error.
    async fn explain(&self, err: &GatewayError) -> SearchError {
        let fallback = SearchError::from(err);
        match self.gateway.fetch_quota_status().await {
            Ok(status) if status.rate.is_exhausted() => match status.rate.reset_at() {
                Some(reset_at) => SearchError::QuotaExceeded { reset_at },
                None => fallback,
            },
            Ok(_) => fallback,
            Err(quota_err) => {
                debug!(error = %quota_err, "rate limit check failed; keeping original error");
                fallback
            }
        }
    }
}

fn is_next_page(subject: &Subject, handle: &str, page: u32) -> bool {
    subject.handle == handle && subject.cursor.page + 1 == page
}
