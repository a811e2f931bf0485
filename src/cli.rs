// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - search:     look a user up and print the profile and repositories
// - browse:     page through a user's repositories interactively
// - rate-limit: show how much of the GitHub API budget is left
// - cache:      inspect or wipe the local response cache
//
// Global flags (usable before or after the subcommand) configure where we
// talk to and where the cache lives. Some of them can also come from
// environment variables thanks to clap's `env` feature.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::github::DEFAULT_API_URL;
use crate::scroll::DEFAULT_THRESHOLD;

#[derive(Parser, Debug)]
#[command(
    name = "github-user-finder",
    version,
    about = "Look up GitHub users and browse their repositories",
    long_about = "github-user-finder fetches a GitHub profile and its public repositories, \
                  ten at a time. Responses are cached for 30 minutes so repeated lookups \
                  don't eat into the unauthenticated rate limit."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

// Flags shared by every subcommand
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Base URL of the GitHub REST API
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Where to keep cached responses (defaults to the platform cache dir)
    #[arg(long, global = true, env = "GITHUB_USER_FINDER_CACHE")]
    pub cache_file: Option<PathBuf>,

    /// Keep the cache in memory only; nothing is written to disk
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Log debug output to stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a user's profile and their most recently updated repositories
    ///
    /// Example: github-user-finder search octocat --pages 2
    Search {
        /// GitHub username to look up
        handle: String,

        /// How many pages of 10 repositories to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Output the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scroll through a user's repositories; more load as you near the end
    ///
    /// Keys: Enter/j = down, k = up, x = dismiss error, /name = search
    /// another user, c or a bare / = clear, q = quit
    Browse {
        /// GitHub username to look up
        handle: String,

        /// Rows shown per screen
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
        rows: u32,

        /// Start loading the next page this close to the end (1 row = 40)
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,
    },

    /// Show the remaining GitHub API quota
    RateLimit {
        /// Output the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or clear the local response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached entries
    Stats {
        /// Output the stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every cached entry
    Clear,
}

// One line typed into the browse pager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerKey {
    Down,
    Up,
    DismissError,
    /// "/name": look up another user from the same screen
    Search(String),
    /// "c" or a bare "/": back to an empty screen
    Clear,
    Quit,
    Unknown(String),
}

impl PagerKey {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(handle) = line.strip_prefix('/') {
            let handle = handle.trim();
            if handle.is_empty() {
                return PagerKey::Clear;
            }
            return PagerKey::Search(handle.to_string());
        }
        match line {
            "" | "j" => PagerKey::Down,
            "k" => PagerKey::Up,
            "x" => PagerKey::DismissError,
            "c" => PagerKey::Clear,
            "q" => PagerKey::Quit,
            other => PagerKey::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["github-user-finder", "search", "octocat"]).unwrap();
        match cli.command {
            Commands::Search { handle, pages, json } => {
                assert_eq!(handle, "octocat");
                assert_eq!(pages, 1);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.global.no_persist);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "github-user-finder",
            "browse",
            "octocat",
            "--no-persist",
            "--threshold",
            "80",
        ])
        .unwrap();
        assert!(cli.global.no_persist);
        assert!(matches!(cli.command, Commands::Browse { threshold: 80, rows: 8, .. }));
    }

    #[test]
    fn test_zero_pages_rejected() {
        let result = Cli::try_parse_from(["github-user-finder", "search", "octocat", "--pages", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_subcommands() {
        let cli = Cli::try_parse_from(["github-user-finder", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
    }

    #[test]
    fn test_pager_keys() {
        assert_eq!(PagerKey::parse(""), PagerKey::Down);
        assert_eq!(PagerKey::parse(" j "), PagerKey::Down);
        assert_eq!(PagerKey::parse("k"), PagerKey::Up);
        assert_eq!(PagerKey::parse("x"), PagerKey::DismissError);
        assert_eq!(PagerKey::parse("q"), PagerKey::Quit);
        assert_eq!(PagerKey::parse("zz"), PagerKey::Unknown("zz".into()));
    }

    #[test]
    fn test_pager_search_and_clear() {
        assert_eq!(PagerKey::parse("/torvalds"), PagerKey::Search("torvalds".into()));
        assert_eq!(PagerKey::parse("/  rust-lang "), PagerKey::Search("rust-lang".into()));
        assert_eq!(PagerKey::parse("/"), PagerKey::Clear);
        assert_eq!(PagerKey::parse("/   "), PagerKey::Clear);
        assert_eq!(PagerKey::parse("c"), PagerKey::Clear);
    }
}
