// src/output.rs
// =============================================================================
// Everything that ends up on stdout.
//
// Two output styles, like most CLIs:
// - Human-readable: a profile card, a repository table, a quota bar
// - JSON (--json): the same data, machine-readable, for scripts
//
// The formatting helpers (format_count, format_updated, ...) are pure
// functions so they can be tested without capturing stdout. Logs go to
// stderr through tracing and never mix with this output.
// =============================================================================

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::config::CacheLocation;
use crate::finder::SearchState;
use crate::github::{format_reset_time, Profile, QuotaLevel, QuotaWindow, RateLimitStatus, RepositorySummary};

const NAME_WIDTH: usize = 32;
const LANGUAGE_WIDTH: usize = 12;
const BAR_WIDTH: usize = 20;

// Prints any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// Prints the outcome of a search: card + table, or the state view as JSON
pub fn print_search(state: &SearchState, json: bool, now: DateTime<Utc>) -> Result<()> {
    if json {
        return print_json(&state.view());
    }

    if let Some(profile) = state.profile() {
        print_profile(profile);
        println!();
        let repositories = state.repositories();
        if repositories.is_empty() {
            println!("📭 No public repositories");
        } else {
            print_table(repositories, now);
            println!();
            println!(
                "📋 Showing {} of {} repositories (page {}{})",
                repositories.len(),
                format_count(u64::from(profile.public_repos)),
                state.current_page(),
                if state.has_more_repos() { ", more available" } else { "" }
            );
        }
    }

    if let Some(error) = state.error() {
        println!("❌ {error}");
    }
    Ok(())
}

// One screen of the interactive pager: rows [first_row, first_row + rows)
pub fn print_browse_window(state: &SearchState, first_row: usize, rows: usize, now: DateTime<Utc>) {
    println!();
    let repositories = state.repositories();
    match state.profile() {
        Some(profile) => println!(
            "👤 {} (@{}) · {} of {} repositories",
            profile.display_name(),
            profile.login,
            repositories.len(),
            format_count(u64::from(profile.public_repos))
        ),
        None if state.is_loading() => println!("⏳ Searching for {}...", state.searched_handle()),
        None if state.searched_handle().is_empty() => println!("🔎 Type /<username> to search"),
        None => {}
    }

    let end = (first_row + rows).min(repositories.len());
    for (index, repository) in repositories.iter().enumerate().take(end).skip(first_row) {
        println!("{:>3}. {}", index + 1, repository_row(repository, now));
    }

    if state.is_loading() && state.profile().is_some() {
        println!("⏳ Loading more...");
    } else if end == repositories.len() && !state.has_more_repos() && !repositories.is_empty() {
        println!("🏁 End of list");
    }
    if let Some(error) = state.error() {
        println!("❌ {error}  (x to dismiss)");
    }
}

pub fn print_profile(profile: &Profile) {
    println!("👤 {} (@{})", profile.display_name(), profile.login);
    if let Some(bio) = profile.bio.as_deref().filter(|bio| !bio.is_empty()) {
        println!("   {bio}");
    }
    for (label, value) in [
        ("🏢", &profile.company),
        ("📍", &profile.location),
        ("🔗", &profile.blog),
        ("✉️ ", &profile.email),
    ] {
        if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
            println!("   {label} {value}");
        }
    }
    if let Some(twitter) = profile.twitter_username.as_deref() {
        println!("   🐦 @{twitter}");
    }
    println!(
        "   📦 {} repos · 📝 {} gists · 👥 {} followers · {} following",
        format_count(u64::from(profile.public_repos)),
        format_count(u64::from(profile.public_gists)),
        format_count(u64::from(profile.followers)),
        format_count(u64::from(profile.following)),
    );
    println!("   {}", member_since(&profile.created_at));
    println!("   {}", profile.html_url);
}

// Prints repositories as a table, one per line
pub fn print_table(repositories: &[RepositorySummary], now: DateTime<Utc>) {
    println!(
        "{:<NAME_WIDTH$} {:<LANGUAGE_WIDTH$} {:>8} {:>7}  {}",
        "NAME", "LANGUAGE", "STARS", "FORKS", "UPDATED"
    );
    println!("{}", "=".repeat(NAME_WIDTH + LANGUAGE_WIDTH + 40));
    for repository in repositories {
        println!("{}", repository_row(repository, now));
    }
}

// One table row, plus description and topic lines when present
pub fn repository_row(repository: &RepositorySummary, now: DateTime<Utc>) -> String {
    let mut row = format!(
        "{:<NAME_WIDTH$} {:<LANGUAGE_WIDTH$} {:>8} {:>7}  {}",
        truncate(&repository.name, NAME_WIDTH),
        truncate(repository.language.as_deref().unwrap_or("-"), LANGUAGE_WIDTH),
        format_count(u64::from(repository.stargazers_count)),
        format_count(u64::from(repository.forks_count)),
        format_updated(&repository.updated_at, now),
    );
    if let Some(description) = repository.description.as_deref().filter(|d| !d.is_empty()) {
        row.push_str(&format!("\n    {}", truncate(description, NAME_WIDTH * 2)));
    }
    let topics = repository.display_topics();
    if !topics.is_empty() {
        let tags: Vec<String> = topics.iter().map(|topic| format!("#{topic}")).collect();
        row.push_str(&format!("\n    {}", tags.join(" ")));
    }
    row
}

pub fn print_rate_limit(status: &RateLimitStatus, json: bool) -> Result<()> {
    if json {
        return print_json(status);
    }

    let rate = &status.rate;
    println!(
        "{} API calls: {}/{} remaining",
        level_icon(rate.level()),
        format_count(u64::from(rate.remaining)),
        format_count(u64::from(rate.limit))
    );
    println!(
        "   [{}] {:.0}% ({})",
        quota_bar(rate.percent_remaining(), BAR_WIDTH),
        rate.percent_remaining(),
        level_label(rate.level())
    );
    if let Some(reset_at) = rate.reset_at() {
        println!("   Resets at {}", format_reset_time(&reset_at));
    }
    println!();
    println!("{:<10} {:>10} {:>10}", "RESOURCE", "REMAINING", "LIMIT");
    println!("{}", "=".repeat(32));
    for (name, window) in [
        ("core", &status.resources.core),
        ("search", &status.resources.search),
        ("graphql", &status.resources.graphql),
    ] {
        println!("{}", resource_row(name, window));
    }
    Ok(())
}

fn resource_row(name: &str, window: &QuotaWindow) -> String {
    format!(
        "{:<10} {:>10} {:>10}",
        name,
        format_count(u64::from(window.remaining)),
        format_count(u64::from(window.limit))
    )
}

pub fn print_cache_stats(stats: &CacheStats, location: &CacheLocation, json: bool) -> Result<()> {
    if json {
        return print_json(stats);
    }

    match location {
        CacheLocation::File(path) => println!("🗄️  Cache file: {}", path.display()),
        CacheLocation::Memory => println!("🗄️  Cache: in memory (nothing persisted)"),
    }
    println!("📋 Entries: {}", stats.total_items);
    for key in &stats.keys {
        println!("   {key}");
    }
    Ok(())
}

// 1234567 -> "1,234,567"
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// "Member since January 25, 2011"
pub fn member_since(created_at: &DateTime<Utc>) -> String {
    format!("Member since {}", created_at.format("%B %-d, %Y"))
}

// Relative age of a repository's last update, in whole days
pub fn format_updated(updated_at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - *updated_at).num_days();
    match days {
        i64::MIN..=0 => "Updated today".to_string(),
        1 => "Updated yesterday".to_string(),
        2..=29 => format!("Updated {days} days ago"),
        30..=364 => plural_ago(days / 30, "month"),
        _ => plural_ago(days / 365, "year"),
    }
}

fn plural_ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("Updated 1 {unit} ago")
    } else {
        format!("Updated {count} {unit}s ago")
    }
}

// A fixed-width bar, e.g. "██████░░░░" for 60%
pub fn quota_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn level_icon(level: QuotaLevel) -> &'static str {
    match level {
        QuotaLevel::Healthy => "🟢",
        QuotaLevel::Low => "🟡",
        QuotaLevel::Critical => "🔴",
    }
}

fn level_label(level: QuotaLevel) -> &'static str {
    match level {
        QuotaLevel::Healthy => "healthy",
        QuotaLevel::Low => "low",
        QuotaLevel::Critical => "critical",
    }
}

// Cuts `text` to `max` characters, ending with "..." when shortened
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
