// src/config.rs
// =============================================================================
// Turns the global command-line flags into a validated configuration.
//
// Everything comes from flags (or their environment variables); there is
// no config file. The two decisions made here:
// - which GitHub API to talk to (must be a usable base URL)
// - where the cache lives: a JSON file in the platform cache directory,
//   a user-chosen file, or memory only
// =============================================================================

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::cache::{Cache, FileStorage, MemoryStorage};
use crate::cli::GlobalArgs;

// Sub-directory and file name under the platform cache dir
const APP_DIR: &str = "github-user-finder";
const CACHE_FILE_NAME: &str = "cache.json";

// Where cached responses are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// Persisted JSON file
    File(PathBuf),
    /// Lives only as long as the process
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub cache: CacheLocation,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let api_url = parse_api_url(&args.api_url)?;
        let cache = resolve_cache_location(
            args.no_persist,
            args.cache_file.as_deref(),
            default_cache_path(),
        );
        debug!(api_url = %api_url, cache = ?cache, "configuration resolved");
        Ok(Self { api_url, cache })
    }

    // Opens the configured cache
    //
    // Fails only if an existing cache file cannot be read at all.
    pub fn open_cache(&self) -> Result<Cache> {
        match &self.cache {
            CacheLocation::File(path) => Ok(Cache::new(FileStorage::open(path.clone())?)),
            CacheLocation::Memory => Ok(Cache::new(MemoryStorage::new())),
        }
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid API URL: {raw}"))?;
    if url.cannot_be_a_base() {
        bail!("Invalid API URL: {raw} cannot be used as a base");
    }
    Ok(url)
}

// `<platform cache dir>/github-user-finder/cache.json`, if the platform has one
pub fn default_cache_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.cache_dir().join(APP_DIR).join(CACHE_FILE_NAME))
}

fn resolve_cache_location(
    no_persist: bool,
    explicit: Option<&Path>,
    default: Option<PathBuf>,
) -> CacheLocation {
    if no_persist {
        return CacheLocation::Memory;
    }
    match explicit.map(Path::to_path_buf).or(default) {
        Some(path) => CacheLocation::File(path),
        None => {
            warn!("no cache directory on this platform; caching in memory only");
            CacheLocation::Memory
        }
    }
}
