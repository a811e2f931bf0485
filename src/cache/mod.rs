// src/cache/mod.rs
// =============================================================================
// This module keeps GitHub responses around between runs.
//
// Submodules:
// - storage: Raw key-value backends (JSON file on disk, in-memory map)
// - store: The TTL cache itself, with namespaced keys and lazy eviction
//
// Keys look like "profile:<handle>" and "repos:<handle>:page<N>", and every
// entry is valid for 30 minutes after it was written.
// =============================================================================

mod storage;
mod store;

pub use storage::{FileStorage, MemoryStorage};
pub use store::{profile_key, repos_key, Cache, CacheStats};
