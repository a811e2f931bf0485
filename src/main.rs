// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr) and the configuration (API URL, cache)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = the search ended in an error,
//    2 = internal error such as a bad flag or an unreadable cache file)
//
// Rust concepts used:
// - async/await: Network requests and the interactive pager
// - Arc: Sharing one Finder between the pager and background loads
// - tokio::select!: Waiting for a key press OR a state change, whichever
//   comes first
// =============================================================================

mod cache; // src/cache/ - TTL cache over a key-value store
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - flags -> validated configuration
mod finder; // src/finder/ - search + pagination state machine
mod github; // src/github/ - GitHub REST client
mod output; // src/output.rs - tables, cards and JSON
mod scroll; // src/scroll/ - "near the end of the list" trigger

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{CacheAction, Cli, Commands, PagerKey};
use config::Config;
use finder::Finder;
use github::{Gateway, GithubClient};
use scroll::{LoadFlags, ScrollTrigger, Viewport};

// Height of one pager row in scroll-distance units
const ROW_HEIGHT: u32 = 40;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = finished cleanly
//   Ok(1) = the search ended with an error shown to the user
//   Err   = anything else (reported as exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = Config::from_args(&cli.global)?;

    match cli.command {
        Commands::Search {
            handle,
            pages,
            json,
        } => handle_search(&config, &handle, pages, json).await,
        Commands::Browse {
            handle,
            rows,
            threshold,
        } => handle_browse(&config, &handle, rows, threshold).await,
        Commands::RateLimit { json } => handle_rate_limit(&config, json).await,
        Commands::Cache { action } => handle_cache(&config, action),
    }
}

// Logs go to stderr so stdout stays clean for tables and JSON.
// RUST_LOG wins over --verbose.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,github_user_finder={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_finder(config: &Config) -> Result<Finder<GithubClient>> {
    let client = GithubClient::new(config.api_url.clone())?;
    Ok(Finder::new(client, config.open_cache()?))
}

// Handles the 'search' subcommand
// Parameters:
//   handle: GitHub username
//   pages: how many pages of repositories to load in total
//   json: whether to output JSON format
async fn handle_search(config: &Config, handle: &str, pages: u32, json: bool) -> Result<i32> {
    let finder = build_finder(config)?;

    finder.search(handle).await;
    for _ in 1..pages {
        if !finder.state().has_more_repos() {
            break;
        }
        finder.load_more().await;
    }

    let state = finder.state();
    output::print_search(&state, json, Utc::now())?;

    Ok(if state.error().is_some() { 1 } else { 0 })
}

// Handles the 'browse' subcommand
//
// The pager redraws whenever a key is pressed or the finder's state
// changes. Every redraw reports the visible rows to the scroll trigger,
// which starts a background load_more() when the end comes close.
async fn handle_browse(config: &Config, handle: &str, rows: u32, threshold: u32) -> Result<i32> {
    let finder = Arc::new(build_finder(config)?);
    finder.search(handle).await;

    let background = Arc::clone(&finder);
    let mut trigger = ScrollTrigger::new(move || {
        let finder = Arc::clone(&background);
        tokio::spawn(async move { finder.load_more().await });
    })
    .with_threshold(threshold);

    let mut updates = finder.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut first_row: u32 = 0;

    loop {
        let state = updates.borrow_and_update().clone();
        let total = u32::try_from(state.repositories().len()).unwrap_or(u32::MAX);
        first_row = first_row.min(total.saturating_sub(1));

        trigger.sync(
            total.saturating_mul(ROW_HEIGHT),
            LoadFlags {
                has_more: state.has_more_repos(),
                loading: state.is_loading(),
                page: state.current_page(),
            },
        );
        trigger.observe(Viewport {
            offset: first_row.saturating_mul(ROW_HEIGHT),
            height: rows.saturating_mul(ROW_HEIGHT),
        });

        output::print_browse_window(&state, first_row as usize, rows as usize, Utc::now());
        println!("[Enter/j] down  [k] up  [x] dismiss error  [/name] search  [c] clear  [q] quit");

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match PagerKey::parse(&line) {
                    PagerKey::Down => first_row = first_row.saturating_add(1),
                    PagerKey::Up => first_row = first_row.saturating_sub(1),
                    PagerKey::DismissError => finder.clear_error(),
                    PagerKey::Search(handle) => {
                        first_row = 0;
                        finder.search(&handle).await;
                    }
                    PagerKey::Clear => {
                        first_row = 0;
                        finder.clear_search();
                    }
                    PagerKey::Quit => break,
                    PagerKey::Unknown(key) => debug!(key = %key, "ignored key"),
                }
            }
        }
    }

    Ok(if finder.state().error().is_some() { 1 } else { 0 })
}

// Handles the 'rate-limit' subcommand
async fn handle_rate_limit(config: &Config, json: bool) -> Result<i32> {
    let client = GithubClient::new(config.api_url.clone())?;
    let status = client.fetch_quota_status().await?;
    output::print_rate_limit(&status, json)?;
    Ok(0)
}

// Handles the 'cache' subcommand
fn handle_cache(config: &Config, action: CacheAction) -> Result<i32> {
    let cache = config.open_cache()?;
    match action {
        CacheAction::Stats { json } => {
            output::print_cache_stats(&cache.stats(), &config.cache, json)?;
        }
        CacheAction::Clear => {
            let removed = cache.stats().total_items;
            cache.clear();
            println!("🧹 Removed {} cached entries", removed);
        }
    }
    Ok(0)
}

// =============================================================================
// BEGINNER NOTES:
//
// 1. Why Arc<Finder<...>> in browse but not in search?
//    - search runs everything in order, so a plain value is enough
//    - browse hands load_more() to tokio::spawn, and a spawned task must
//      own what it uses ('static). Arc lets the pager and the task share
//      the same Finder
//
// 2. Why does the trigger's closure spawn instead of awaiting?
//    - The trigger calls a plain FnMut() while we are drawing. Spawning
//      lets the page keep reacting to keys while GitHub answers; the
//      watch channel tells us when to redraw
//
// 3. Is next_line() safe inside select!?
//    - Yes. If the state change wins, no input is lost; the next loop
//      iteration calls next_line() again and picks up where it left off
// =============================================================================
