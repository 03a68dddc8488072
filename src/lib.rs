//! Crawler and offline derivation passes for club and national team statistics.
//!
//! Crawl: seed list -> one request per entity and season -> extracted records
//! -> one JSON array per category. Second pass: gap reports for targeted
//! re-crawls, national-player counts and team size ratios.

pub mod category;
pub mod cli;
pub mod config;
pub mod derive;
pub mod emit;
mod error;
pub mod gaps;
mod macros;
pub mod parse;
pub mod process;
pub mod record;
pub mod request;
pub mod seed;

pub use error::{Error, Result};

const BASE_URL: &str = "https://www.transfermarkt.world";
/// Inclusive.
const YEARS_START: i32 = 2014;
/// Exclusive.
const YEARS_END: i32 = 2025;
const DEFAULT_CONCURRENCY: usize = 16;
const DEFAULT_MAX_RETRIES: u32 = 2;
const BACKOFF_BASE_MS: u64 = 500;
const TEAM_LISTING_PAGES: u32 = 22;
const NATIONAL_LISTING_PAGES: u32 = 9;
/// Roster sub-links containing this token point at a club, not a player.
const NON_PLAYER_MARKER: &str = "verein";
