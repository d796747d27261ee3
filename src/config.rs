use crate::analysis::filter::MatchFilter;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SEASON_START: &str = "2025-01-09T00:00:00Z";
pub const DEFAULT_RANKED_QUEUES: [u16; 2] = [420, 440];
pub const DEFAULT_MIN_GAME_DURATION_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub region: String,
    pub roster: Vec<String>,
    pub filter: MatchFilter,
    pub match_history_limit: usize,
    pub request_timeout: Duration,
    pub requests_per_second: u32,
    pub max_concurrent_players: usize,
    pub refresh_interval: Duration,
    pub cache_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so callers other than
    /// the process environment (tests, mostly) can supply values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("RIOT_API_KEY").ok_or_else(|| {
            AppError::ConfigError("RIOT_API_KEY not found in environment or .env file".to_string())
        })?;

        let region = get("RIOT_REGION").unwrap_or_else(|| "na1".to_string());

        let roster = parse_roster(&get("TRACKED_PUUIDS").unwrap_or_default());
        if roster.is_empty() {
            return Err(AppError::ConfigError(
                "TRACKED_PUUIDS must list at least one player".to_string(),
            ));
        }

        let ranked_queues = match get("RANKED_QUEUES") {
            Some(raw) => parse_list::<u16>("RANKED_QUEUES", &raw)?,
            None => DEFAULT_RANKED_QUEUES.to_vec(),
        };
        let season_start = parse_instant(
            "SEASON_START",
            get("SEASON_START").as_deref().unwrap_or(DEFAULT_SEASON_START),
        )?;
        let min_duration_secs =
            parse_or("MIN_GAME_DURATION_SECS", get("MIN_GAME_DURATION_SECS"), DEFAULT_MIN_GAME_DURATION_SECS)?;

        let cache_file = get("CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_file);

        Ok(Config {
            api_key,
            region,
            roster,
            filter: MatchFilter::new(ranked_queues, season_start, min_duration_secs),
            match_history_limit: parse_or("MATCH_HISTORY_LIMIT", get("MATCH_HISTORY_LIMIT"), 1000)?,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                10,
            )?),
            requests_per_second: parse_or("REQUESTS_PER_SECOND", get("REQUESTS_PER_SECOND"), 20)?,
            max_concurrent_players: parse_or(
                "MAX_CONCURRENT_PLAYERS",
                get("MAX_CONCURRENT_PLAYERS"),
                4,
            )?,
            refresh_interval: Duration::from_secs(parse_or(
                "REFRESH_INTERVAL_SECS",
                get("REFRESH_INTERVAL_SECS"),
                300,
            )?),
            cache_file,
        })
    }
}

pub fn default_cache_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".league_roster")
        .join("aggregates.json")
}

/// Comma separated, order preserved, duplicates dropped.
fn parse_roster(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

fn parse_list<T: FromStr>(key: &str, raw: &str) -> Result<Vec<T>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::ConfigError(format!("{} has an invalid entry: {}", key, v)))
        })
        .collect()
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::ConfigError(format!("{} is not a valid number: {}", key, v))),
        None => Ok(default),
    }
}

fn parse_instant(key: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::ConfigError(format!("{} is not an RFC 3339 instant: {}", key, e)))
}
