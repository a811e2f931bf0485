// src/finder/mod.rs
// =============================================================================
// This module is the brain of the app: it owns the current search.
//
// Submodules:
// - controller: Finder, which runs search / load_more / clear_*
// - state: The state machine the front end reads (SearchState, StateView)
// - error: SearchError, the messages a user can see
//
// Data flow:
//   search(handle) -> cache? -> GitHub profile + page 1 -> Ready
//   load_more()    -> cache? -> GitHub page N+1        -> Ready (appended)
// =============================================================================

mod controller;
mod error;
mod state;

pub use controller::Finder;
pub use state::SearchState;
